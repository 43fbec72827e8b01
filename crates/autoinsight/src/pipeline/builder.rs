//! Main analysis pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating load, clean, analyze and export.

use crate::analyzer::DataAnalyzer;
use crate::cleaner::DataCleaner;
use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::error::{InsightError, Result};
use crate::loader::DataLoader;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::reporting::{ChartGenerator, ReportGenerator, ReportParams};
use crate::types::{
    AnalysisBundle, ChartArtifact, CleaningReport, LoadMetadata, MissingReport, OutlierReport,
};
use crate::utils::nan_to_null;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub metadata: LoadMetadata,
    /// Missing-value profile of the table as loaded
    pub missing_before: MissingReport,
    /// Missing-value profile after cleaning
    pub missing_after: MissingReport,
    pub cleaning_report: CleaningReport,
    pub outlier_report: OutlierReport,
    pub analysis: AnalysisBundle,
    /// Empty unless chart generation is enabled
    pub charts: Vec<ChartArtifact>,
    /// Set when a report was written
    pub report_path: Option<PathBuf>,
    pub duration: Duration,
    pub cleaned_data: DataFrame,
}

/// The main analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autoinsight::{AnalysisConfig, PackageTier, Pipeline};
///
/// let config = AnalysisConfig::builder()
///     .tier(PackageTier::Pro)
///     .emit_report(true)
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("data/sales.csv")?;
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    loader: DataLoader,
    reporter: ReportGenerator,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load `path` and run every stage on it.
    ///
    /// # Errors
    ///
    /// Loader errors (missing file, unsupported format, size limit, parse
    /// failure) and fatal cleaning errors stop the run.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let path = path.as_ref();
        let outcome = self.load(path).and_then(|(df, metadata, started)| {
            self.process_internal(df, metadata, Some(path), started)
        });
        self.finish(outcome)
    }

    /// Run every stage after loading on an already loaded table. NaN is
    /// treated as missing, the same as for loaded files.
    pub fn process(&self, df: DataFrame, metadata: LoadMetadata) -> Result<PipelineResult> {
        let started = Instant::now();
        let outcome = nan_to_null(df)
            .map_err(InsightError::from)
            .and_then(|df| self.process_internal(df, metadata, None, started));
        self.finish(outcome)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn load(&self, path: &Path) -> Result<(DataFrame, LoadMetadata, Instant)> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));
        info!("Step 1: Loading {}...", path.display());

        let (df, metadata) = self.loader.load(path)?;

        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", metadata.rows, metadata.columns),
        ));
        Ok((df, metadata, started))
    }

    fn process_internal(
        &self,
        df: DataFrame,
        metadata: LoadMetadata,
        source: Option<&Path>,
        started: Instant,
    ) -> Result<PipelineResult> {
        let config = &self.config;

        // Step 2: Missing-value profile
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::MissingAnalysis,
            0.0,
            "Analyzing missing values...",
        ));
        info!("Step 2: Analyzing missing values...");
        let mut cleaner = DataCleaner::new(&df);
        let missing_before = cleaner.analyze_missing();
        info!(
            "{} missing cells ({:.2}%)",
            missing_before.missing_cells, missing_before.missing_percentage
        );

        // Step 3: Cleaning
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Cleaning,
            0.0,
            format!("Handling missing values ({})...", config.cleaning.strategy),
        ));
        info!("Step 3: Cleaning data...");
        cleaner.detect_column_types();
        cleaner.handle_missing(config.cleaning.strategy, config.cleaning.threshold)?;
        if config.optimize_dtypes {
            cleaner.optimize_dtypes()?;
        }
        let missing_after = cleaner.analyze_missing();

        // Step 4: Outliers
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::OutlierDetection,
            0.0,
            format!("Detecting outliers ({})...", config.outlier_method),
        ));
        info!("Step 4: Detecting outliers...");
        let outlier_report = cleaner.detect_outliers(config.outlier_method);

        // Step 5: Analysis
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Analysis,
            0.0,
            "Running statistical analysis...",
        ));
        info!("Step 5: Running statistical analysis...");
        let (cleaned_data, cleaning_report) = cleaner.into_parts();
        let analyzer = DataAnalyzer::new(&cleaned_data);
        let mut analysis = AnalysisBundle {
            basic_stats: analyzer.basic_stats(),
            descriptive_statistics: analyzer.descriptive_statistics(),
            categorical_analysis: analyzer.categorical_analysis(),
            correlation: analyzer
                .correlation_analysis(config.correlation.method, config.correlation.threshold),
            variance_analysis: analyzer.variance_analysis(config.variance_top_n),
            distribution_tests: analyzer.distribution_tests(),
            time_patterns: analyzer.detect_time_patterns(),
            insights: Vec::new(),
        };

        // Step 6: Insights
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Insights,
            0.0,
            "Generating insights...",
        ));
        info!("Step 6: Generating insights...");
        analysis.insights = analyzer.generate_insights();

        // Step 7: Charts
        let charts = if config.generate_charts {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::Charts,
                0.0,
                "Exporting chart data...",
            ));
            info!("Step 7: Exporting chart data...");
            ChartGenerator::new(&cleaned_data, &config.output_dir)
                .generate_all(config.correlation.method)
        } else {
            info!("Step 7: Skipping chart data (disabled)");
            Vec::new()
        };

        // Step 8: Report
        let report_path = if !config.emit_report {
            None
        } else if !config.tier.supports_full_report() {
            warn!(
                "The '{}' package does not include the full report; skipping",
                config.tier
            );
            None
        } else {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::Report,
                0.0,
                "Writing report...",
            ));
            info!("Step 8: Writing report...");
            let input_file = source.unwrap_or_else(|| Path::new(&metadata.filename));
            let report = ReportGenerator::build_comprehensive_report(ReportParams {
                input_file,
                tier: config.tier,
                duration: started.elapsed(),
                metadata: &metadata,
                missing_before: &missing_before,
                missing_after: &missing_after,
                cleaning: &cleaning_report,
                outliers: &outlier_report,
                analysis: &analysis,
                charts: &charts,
            });
            let stem = report_stem(input_file);
            Some(self.reporter.write_report_to_file(&report, &stem)?)
        };

        let duration = started.elapsed();
        info!("Analysis finished in {:.2}s", duration.as_secs_f64());

        Ok(PipelineResult {
            metadata,
            missing_before,
            missing_after,
            cleaning_report,
            outlier_report,
            analysis,
            charts,
            report_path,
            duration,
            cleaned_data,
        })
    }
}

fn report_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "analysis".to_string())
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let loader = DataLoader::new(config.tier);
        let reporter = ReportGenerator::new(config.output_dir.clone());

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            loader,
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorrelationConfig, PackageTier};
    use crate::types::FileFormat;
    use std::sync::Mutex;

    fn sample() -> (DataFrame, LoadMetadata) {
        let df = df![
            "price" => [Some(10.0), Some(12.0), None, Some(11.0), Some(13.0)],
            "qty" => [1i64, 2, 3, 4, 5],
            "region" => [Some("n"), Some("s"), Some("n"), None, Some("n")],
        ]
        .unwrap();
        let metadata = LoadMetadata {
            rows: 5,
            columns: 3,
            size_mb: 0.0001,
            memory_usage_mb: 0.0001,
            filename: "sales.csv".to_string(),
            format: FileFormat::Csv,
        };
        (df, metadata)
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().tier, PackageTier::Free);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = AnalysisConfig {
            correlation: CorrelationConfig {
                threshold: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_runs_every_stage() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let pipeline = Pipeline::builder()
            .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        let (df, metadata) = sample();
        let result = pipeline.process(df, metadata).unwrap();

        assert_eq!(result.cleaned_data.shape(), (5, 3));
        assert_eq!(result.missing_before.missing_cells, 2);
        assert_eq!(result.analysis.descriptive_statistics.len(), 2);
        assert!(!result.analysis.insights.is_empty());
        assert!(result.charts.is_empty());
        assert!(result.report_path.is_none());

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&AnalysisStage::MissingAnalysis));
        assert_eq!(stages.last(), Some(&AnalysisStage::Complete));
        assert!(!stages.contains(&AnalysisStage::Charts));
    }

    #[test]
    fn test_process_counts_nan_as_missing() {
        let pipeline = Pipeline::builder().build().unwrap();
        let (_, metadata) = sample();
        let df = df![
            "price" => [10.0, f64::NAN, 11.0, 13.0, 12.0],
            "qty" => [1i64, 2, 3, 4, 5],
        ]
        .unwrap();

        let result = pipeline.process(df, metadata).unwrap();
        assert_eq!(result.missing_before.missing_cells, 1);
        let price = result
            .analysis
            .descriptive_statistics
            .iter()
            .find(|s| s.column == "price")
            .unwrap();
        // filled with the median of the four real values
        assert_eq!(price.count, 5);
        assert_eq!(price.mean, Some(11.5));
        assert_eq!(result.cleaned_data.column("price").unwrap().null_count(), 0);
    }

    #[test]
    fn test_free_tier_skips_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::builder()
            .tier(PackageTier::Free)
            .emit_report(true)
            .output_dir(dir.path())
            .build()
            .unwrap();

        let (df, metadata) = sample();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df, metadata)
            .unwrap();
        assert!(result.report_path.is_none());
    }

    #[test]
    fn test_pro_tier_writes_report_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::builder()
            .tier(PackageTier::Pro)
            .emit_report(true)
            .generate_charts(true)
            .output_dir(dir.path())
            .build()
            .unwrap();

        let (df, metadata) = sample();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df, metadata)
            .unwrap();

        let path = result.report_path.unwrap();
        assert_eq!(path, dir.path().join("sales_report.json"));
        assert!(path.exists());
        assert_eq!(result.charts.len(), 6);
    }

    #[test]
    fn test_run_missing_file_reports_failure() {
        let failed = Arc::new(Mutex::new(false));
        let failed_clone = failed.clone();
        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                if update.stage == AnalysisStage::Failed {
                    *failed_clone.lock().unwrap() = true;
                }
            })
            .build()
            .unwrap();

        let err = pipeline.run("does/not/exist.csv").unwrap_err();
        assert!(err.is_input_error());
        assert!(*failed.lock().unwrap());
    }

    #[test]
    fn test_report_stem() {
        assert_eq!(report_stem(Path::new("data/sales.csv")), "sales");
        assert_eq!(report_stem(Path::new("")), "analysis");
    }
}
