//! CLI entry point for AutoInsight.

use anyhow::{Result, anyhow};
use autoinsight::{
    AnalysisConfig, ComprehensiveReport, CorrelationMethod, MissingStrategy, OutlierMethod,
    PackageTier, Pipeline, PipelineResult, ReportGenerator, ReportParams,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// CLI-compatible package tier enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPackage {
    /// 1 MB files, summary only
    Free,
    /// 25 MB files, full report
    Pro,
    /// 200 MB files, full report
    Business,
}

impl From<CliPackage> for PackageTier {
    fn from(cli: CliPackage) -> Self {
        match cli {
            CliPackage::Free => PackageTier::Free,
            CliPackage::Pro => PackageTier::Pro,
            CliPackage::Business => PackageTier::Business,
        }
    }
}

/// CLI-compatible missing-value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStrategy {
    /// Median for numeric columns, mode for the rest
    Auto,
    /// Drop rows that still contain a missing value
    Drop,
    /// Mean of numeric columns
    Mean,
    /// Median of numeric columns
    Median,
    /// Most frequent value of every column
    Mode,
    /// Previous value in row order
    #[value(alias = "ffill")]
    ForwardFill,
}

impl From<CliStrategy> for MissingStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Auto => MissingStrategy::Auto,
            CliStrategy::Drop => MissingStrategy::Drop,
            CliStrategy::Mean => MissingStrategy::Mean,
            CliStrategy::Median => MissingStrategy::Median,
            CliStrategy::Mode => MissingStrategy::Mode,
            CliStrategy::ForwardFill => MissingStrategy::ForwardFill,
        }
    }
}

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Outside 1.5 IQR of the quartiles
    Iqr,
    /// More than 3 standard deviations from the mean of the other values
    #[value(alias = "z-score")]
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::ZScore,
        }
    }
}

/// CLI-compatible correlation method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCorrelationMethod {
    Pearson,
    Spearman,
    Kendall,
}

impl From<CliCorrelationMethod> for CorrelationMethod {
    fn from(cli: CliCorrelationMethod) -> Self {
        match cli {
            CliCorrelationMethod::Pearson => CorrelationMethod::Pearson,
            CliCorrelationMethod::Spearman => CorrelationMethod::Spearman,
            CliCorrelationMethod::Kendall => CorrelationMethod::Kendall,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automated exploratory data analysis",
    long_about = "Load a tabular file, clean it, and report statistics and insights.\n\n\
                  SUPPORTED FORMATS:\n  \
                  csv, tsv, txt, xlsx, xls, ods, json, jsonl, parquet\n\n\
                  EXAMPLES:\n  \
                  # Summary with defaults (free package)\n  \
                  autoinsight sales.csv\n\n  \
                  # Pro package with chart data and a JSON report\n  \
                  autoinsight sales.csv -p pro --charts -r -o results/\n\n  \
                  # Machine-readable output\n  \
                  autoinsight sales.xlsx -p pro --json | jq .executive_summary"
)]
struct Args {
    /// Path to the file to analyze
    file: PathBuf,

    /// Package tier (controls file size limit and report availability)
    #[arg(short, long, value_enum, default_value = "free")]
    package: CliPackage,

    /// Output directory for chart data and reports
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Strategy for filling missing values
    #[arg(short, long, value_enum, default_value = "auto")]
    strategy: CliStrategy,

    /// Missing-value threshold (0.0 - 1.0)
    ///
    /// Columns with a larger missing fraction are dropped
    #[arg(long, default_value = "0.5")]
    threshold: f64,

    /// Outlier detection method
    #[arg(long, value_enum, default_value = "iqr")]
    outlier_method: CliOutlierMethod,

    /// Correlation method
    #[arg(long, value_enum, default_value = "pearson")]
    correlation_method: CliCorrelationMethod,

    /// Minimum |r| for a pair to be listed as strongly correlated
    #[arg(long, default_value = "0.5")]
    correlation_threshold: f64,

    /// Write chart data (JSON) to the output directory
    #[arg(long)]
    charts: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    report: bool,

    /// Downcast numeric columns after cleaning
    #[arg(long)]
    optimize_dtypes: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load environment variables (RUST_LOG) before the subscriber reads them
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let tier: PackageTier = args.package.into();
    if args.report && !tier.supports_full_report() {
        warn!("The '{}' package does not include the full report; --report is ignored", tier);
    }

    let config = AnalysisConfig::builder()
        .tier(tier)
        .missing_strategy(args.strategy.into())
        .missing_threshold(args.threshold)
        .outlier_method(args.outlier_method.into())
        .correlation_method(args.correlation_method.into())
        .correlation_threshold(args.correlation_threshold)
        .optimize_dtypes(args.optimize_dtypes)
        .output_dir(&args.output)
        .generate_charts(args.charts)
        .emit_report(args.report && tier.supports_full_report())
        .build()?;

    let pipeline = build_pipeline(&args, config)?;

    info!("{}", "=".repeat(80));
    info!("Starting analysis of {}", args.file.display());
    info!("{}", "=".repeat(80));

    match pipeline.run(&args.file) {
        Ok(result) => handle_pipeline_output(&result, tier, &args),
        Err(e) => {
            error!("Analysis failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Analysis failed: {}", e))
        }
    }
}

fn build_pipeline(args: &Args, config: AnalysisConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
fn handle_pipeline_output(result: &PipelineResult, tier: PackageTier, args: &Args) -> Result<()> {
    let report = ReportGenerator::build_comprehensive_report(ReportParams {
        input_file: &args.file,
        tier,
        duration: result.duration,
        metadata: &result.metadata,
        missing_before: &result.missing_before,
        missing_after: &result.missing_after,
        cleaning: &result.cleaning_report,
        outliers: &result.outlier_report,
        analysis: &result.analysis,
        charts: &result.charts,
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, result.report_path.as_deref());
    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Print a human-readable summary of the analysis.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &ComprehensiveReport, report_path: Option<&Path>) {
    let summary = &report.processing_summary;
    let analysis = &report.analysis;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:   {} ({}, {:.2} MB, {} package)",
        report.input_file, report.metadata.format, report.metadata.size_mb, report.package
    );
    println!(
        "Shape:   {} rows x {} columns -> {} rows x {} columns",
        summary.rows_before, summary.columns_before, summary.rows_after, summary.columns_after
    );
    println!("Duration: {}ms", summary.duration_ms);
    println!();

    println!("Cleaning:");
    println!(
        "  Missing cells: {} -> {}",
        summary.missing_cells_before, summary.missing_cells_after
    );
    if !summary.dropped_columns.is_empty() {
        println!("  Dropped columns: {}", summary.dropped_columns.join(", "));
    }
    println!(
        "  Outliers ({}): {} values in {} columns",
        report.outliers.method,
        summary.outlier_values,
        report.outliers.columns.len()
    );
    println!();

    if !analysis.descriptive_statistics.is_empty() {
        println!("Descriptive Statistics:");
        println!(
            "  {:<20} {:>12} {:>12} {:>12} {:>12} {:>9}",
            "Column", "Mean", "Std", "Min", "Max", "Missing %"
        );
        println!("  {}", "-".repeat(80));
        for stats in analysis.descriptive_statistics.iter().take(15) {
            println!(
                "  {:<20} {:>12} {:>12} {:>12} {:>12} {:>9.1}",
                truncate_str(&stats.column, 20),
                fmt_opt(stats.mean),
                fmt_opt(stats.std),
                fmt_opt(stats.min),
                fmt_opt(stats.max),
                stats.missing_percentage
            );
        }
        println!();
    }

    if !analysis.correlation.strong_correlations.is_empty() {
        println!("Strong Correlations ({}):", analysis.correlation.method);
        for pair in analysis.correlation.strong_correlations.iter().take(10) {
            println!(
                "  {} <-> {}: {:.3} ({})",
                pair.column_a, pair.column_b, pair.correlation, pair.strength
            );
        }
        println!();
    }

    if !analysis.time_patterns.is_empty() {
        println!("Time Patterns:");
        for pattern in &analysis.time_patterns {
            let range = pattern
                .date_range
                .as_ref()
                .map(|r| format!("{} - {}", r.start, r.end))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} by {}: {} ({} days, {})",
                pattern.value_column, pattern.datetime_column, pattern.trend, pattern.periods, range
            );
        }
        println!();
    }

    println!("Insights:");
    for insight in &analysis.insights {
        println!("  - {}", insight);
    }
    println!();

    let produced: Vec<_> = report.charts.iter().filter(|c| c.is_produced()).collect();
    if !report.charts.is_empty() {
        println!("Chart data: {} of {} written", produced.len(), report.charts.len());
    }
    if let Some(path) = report_path {
        println!("Report written to: {}", path.display());
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
