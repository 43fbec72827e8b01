//! AutoInsight Library
//!
//! Automated exploratory data analysis for tabular files, built with Rust and Polars.
//!
//! # Overview
//!
//! This library turns a CSV, TSV, spreadsheet, JSON or Parquet file into a
//! cleaned table plus a set of statistical findings:
//!
//! - **Loading**: Format detection, package-tier size limits, load metadata
//! - **Cleaning**: Missing-value profiling, threshold-based column drops,
//!   imputation strategies, outlier flagging, dtype downcasting
//! - **Analysis**: Descriptive statistics, categorical summaries, correlation
//!   (pearson, spearman, kendall), variance ranking, Shapiro-Wilk normality,
//!   daily time trends
//! - **Insights**: Plain-language observations derived from the analysis
//! - **Export**: Chart data and a comprehensive JSON report
//! - **Progress Reporting**: Stage-by-stage progress updates
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autoinsight::{AnalysisConfig, MissingStrategy, PackageTier, Pipeline};
//!
//! let config = AnalysisConfig::builder()
//!     .tier(PackageTier::Pro)
//!     .missing_strategy(MissingStrategy::Auto)
//!     .generate_charts(true)
//!     .emit_report(true)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run("data/sales.csv")?;
//!
//! for insight in &result.analysis.insights {
//!     println!("{}", insight);
//! }
//! ```
//!
//! # Using the components directly
//!
//! ```rust,ignore
//! use autoinsight::{CorrelationMethod, DataAnalyzer, DataCleaner, DataLoader, OutlierMethod};
//!
//! let (df, metadata) = DataLoader::default().load("data/sales.csv")?;
//!
//! let mut cleaner = DataCleaner::new(&df);
//! cleaner.handle_missing(MissingStrategy::Median, 0.5)?;
//! let outliers = cleaner.detect_outliers(OutlierMethod::ZScore);
//!
//! let cleaned = cleaner.cleaned_data();
//! let analyzer = DataAnalyzer::new(&cleaned);
//! let correlations = analyzer.correlation_analysis(CorrelationMethod::Kendall, 0.6);
//! ```

pub mod analyzer;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analyzer::DataAnalyzer;
pub use cleaner::DataCleaner;
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, CleaningConfig, ConfigValidationError,
    CorrelationConfig, CorrelationMethod, MissingStrategy, OutlierMethod, PackageTier,
};
pub use error::{InsightError, Result as InsightResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::DataLoader;
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineResult,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{ChartGenerator, ComprehensiveReport, ReportGenerator, ReportParams};
pub use types::{
    AnalysisBundle, BasicStats, CategoricalSummary, ChartArtifact, ChartKind, ChartStatus,
    CleaningReport, ColumnFailure, ColumnKind, ColumnTypeSummary, CorrelationMatrix,
    CorrelationResult, CorrelationStrength, DescriptiveStats, FileFormat, Insight, InsightKind,
    LoadMetadata, MissingReport, NormalityOutcome, NormalityResult, OutlierReport,
    StrongCorrelation, TimePattern, TrendDirection, VarianceEntry,
};
