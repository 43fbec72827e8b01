use crate::config::PackageTier;
use crate::error::{InsightError, Result};
use crate::types::{
    AnalysisBundle, ChartArtifact, CleaningReport, LoadMetadata, MissingReport, OutlierReport,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Insights repeated at the top of the report.
const EXECUTIVE_SUMMARY_LEN: usize = 5;

// ============================================================================
// Comprehensive Report Types
// ============================================================================

/// Comprehensive report merging every stage's output.
///
/// Use this for both JSON output (`--json`) and file writing (`--report`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    pub package: PackageTier,
    pub processing_summary: ProcessingSummary,
    /// First insights, in rule order
    pub executive_summary: Vec<String>,
    pub metadata: LoadMetadata,
    /// Missing values before any cleaning
    pub missing_before: MissingReport,
    pub cleaning: CleaningReport,
    pub outliers: OutlierReport,
    pub analysis: AnalysisBundle,
    pub charts: Vec<ChartArtifact>,
}

/// Shape and missing-value changes made by cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub dropped_columns: Vec<String>,
    pub missing_cells_before: usize,
    pub missing_cells_after: usize,
    pub outlier_values: usize,
}

/// Parameters for building a comprehensive report.
pub struct ReportParams<'a> {
    pub input_file: &'a Path,
    pub tier: PackageTier,
    pub duration: Duration,
    pub metadata: &'a LoadMetadata,
    pub missing_before: &'a MissingReport,
    pub missing_after: &'a MissingReport,
    pub cleaning: &'a CleaningReport,
    pub outliers: &'a OutlierReport,
    pub analysis: &'a AnalysisBundle,
    pub charts: &'a [ChartArtifact],
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build a comprehensive report from stage outputs.
    pub fn build_comprehensive_report(params: ReportParams<'_>) -> ComprehensiveReport {
        let ReportParams {
            input_file,
            tier,
            duration,
            metadata,
            missing_before,
            missing_after,
            cleaning,
            outliers,
            analysis,
            charts,
        } = params;

        let handling = cleaning.missing_handling.as_ref();
        let (rows_after, columns_after) = handling
            .map(|h| h.new_shape)
            .unwrap_or((metadata.rows, metadata.columns));

        let processing_summary = ProcessingSummary {
            duration_ms: duration.as_millis() as u64,
            rows_before: metadata.rows,
            rows_after,
            columns_before: metadata.columns,
            columns_after,
            dropped_columns: handling.map(|h| h.dropped_columns.clone()).unwrap_or_default(),
            missing_cells_before: missing_before.missing_cells,
            missing_cells_after: missing_after.missing_cells,
            outlier_values: outliers.total_outliers(),
        };

        ComprehensiveReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.display().to_string(),
            package: tier,
            processing_summary,
            executive_summary: analysis
                .insights
                .iter()
                .take(EXECUTIVE_SUMMARY_LEN)
                .map(|i| i.message.clone())
                .collect(),
            metadata: metadata.clone(),
            missing_before: missing_before.clone(),
            cleaning: cleaning.clone(),
            outliers: outliers.clone(),
            analysis: analysis.clone(),
            charts: charts.to_vec(),
        }
    }

    /// Write a comprehensive report to a JSON file.
    ///
    /// If `report_base_name` is "sales", the file will be "sales_report.json".
    pub fn write_report_to_file(
        &self,
        report: &ComprehensiveReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        let report_path = self.output_dir.join(format!("{}_report.json", report_base_name));
        let failed = |e: std::io::Error| {
            InsightError::ReportGenerationFailed(format!("{}: {}", report_path.display(), e))
        };

        fs::create_dir_all(&self.output_dir).map_err(failed)?;
        let mut file = File::create(&report_path).map_err(failed)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())
            .map_err(failed)?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DataAnalyzer;
    use crate::cleaner::DataCleaner;
    use crate::config::{MissingStrategy, OutlierMethod};
    use crate::types::FileFormat;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn report() -> ComprehensiveReport {
        let df = df![
            "price" => [Some(10.0), Some(12.0), None, Some(11.0)],
            "city" => ["a", "b", "a", "a"],
        ]
        .unwrap();
        let metadata = LoadMetadata {
            rows: 4,
            columns: 2,
            size_mb: 0.0001,
            memory_usage_mb: 0.0001,
            filename: "sales.csv".to_string(),
            format: FileFormat::Csv,
        };

        let mut cleaner = DataCleaner::new(&df);
        let missing_before = cleaner.analyze_missing();
        cleaner.handle_missing(MissingStrategy::Auto, 0.5).unwrap();
        let missing_after = cleaner.analyze_missing();
        let outliers = cleaner.detect_outliers(OutlierMethod::Iqr);
        let analysis = DataAnalyzer::new(cleaner.data()).analyze_all(&Default::default(), 10);

        ReportGenerator::build_comprehensive_report(ReportParams {
            input_file: Path::new("data/sales.csv"),
            tier: PackageTier::Pro,
            duration: Duration::from_millis(42),
            metadata: &metadata,
            missing_before: &missing_before,
            missing_after: &missing_after,
            cleaning: cleaner.report(),
            outliers: &outliers,
            analysis: &analysis,
            charts: &[],
        })
    }

    #[test]
    fn test_build_report_summary() {
        let report = report();
        let summary = &report.processing_summary;
        assert_eq!(summary.duration_ms, 42);
        assert_eq!((summary.rows_before, summary.rows_after), (4, 4));
        assert_eq!(summary.missing_cells_before, 1);
        assert_eq!(summary.missing_cells_after, 0);
        assert_eq!(report.input_file, "data/sales.csv");
        assert_eq!(report.executive_summary[0], "The dataset has 4 rows and 2 columns.");
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().join("out"));
        let report = report();

        let path = generator.write_report_to_file(&report, "sales").unwrap();
        assert_eq!(path.file_name().unwrap(), "sales_report.json");

        let written: ComprehensiveReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.generated_at, report.generated_at);
        assert_eq!(written.package, PackageTier::Pro);
        assert_eq!(written.executive_summary, report.executive_summary);
        assert_eq!(written.analysis.insights, report.analysis.insights);
    }
}
