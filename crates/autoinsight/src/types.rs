//! Value types produced by the loader, cleaner, analyzer and chart exporter.
//!
//! Everything here is plain data: owned, serializable, and `Send + Sync` so a
//! finished report can be handed to another thread or a front-end.

use crate::config::{CorrelationMethod, MissingStrategy, OutlierMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Column classification
// ============================================================================

/// Semantic kind of a column, decided once per classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Text => "text",
        }
    }

    /// Categorical and free-text columns share the value-count based analyses.
    pub fn is_categorical_or_text(&self) -> bool {
        matches!(self, Self::Categorical | Self::Text)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names grouped by [`ColumnKind`], each list in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeSummary {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub datetime: Vec<String>,
    pub text: Vec<String>,
}

impl ColumnTypeSummary {
    pub fn columns_of(&self, kind: ColumnKind) -> &[String] {
        match kind {
            ColumnKind::Numeric => &self.numeric,
            ColumnKind::Categorical => &self.categorical,
            ColumnKind::Datetime => &self.datetime,
            ColumnKind::Text => &self.text,
        }
    }

    pub(crate) fn push(&mut self, kind: ColumnKind, name: String) {
        match kind {
            ColumnKind::Numeric => self.numeric.push(name),
            ColumnKind::Categorical => self.categorical.push(name),
            ColumnKind::Datetime => self.datetime.push(name),
            ColumnKind::Text => self.text.push(name),
        }
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        [
            ColumnKind::Numeric,
            ColumnKind::Categorical,
            ColumnKind::Datetime,
            ColumnKind::Text,
        ]
        .into_iter()
        .find(|kind| self.columns_of(*kind).iter().any(|c| c == column))
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Input format detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Tsv,
    /// `.txt` with a sniffed delimiter
    DelimitedText,
    Spreadsheet,
    Json,
    JsonLines,
    Parquet,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::DelimitedText => "txt",
            Self::Spreadsheet => "spreadsheet",
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Parquet => "parquet",
        };
        f.write_str(name)
    }
}

/// Facts about a freshly loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadMetadata {
    pub rows: usize,
    pub columns: usize,
    /// On-disk size of the source file.
    pub size_mb: f64,
    /// Estimated in-memory size of the parsed table.
    pub memory_usage_mb: f64,
    pub filename: String,
    pub format: FileFormat,
}

// ============================================================================
// Cleaning
// ============================================================================

/// A per-column failure that did not abort the surrounding operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFailure {
    pub column: String,
    pub reason: String,
}

impl ColumnFailure {
    pub fn new(column: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// Missing-value profile of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingReport {
    pub total_cells: usize,
    pub missing_cells: usize,
    pub missing_percentage: f64,
    /// Only columns with at least one missing value, in table order.
    pub columns: Vec<ColumnMissing>,
}

impl MissingReport {
    pub fn column(&self, name: &str) -> Option<&ColumnMissing> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// How a column's missing values were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    Mean,
    Median,
    Mode,
    /// The "Unknown" placeholder for string columns without a mode
    Sentinel,
    ForwardFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFill {
    pub column: String,
    pub method: FillMethod,
    /// Fill value rendered as text; `None` for forward fill.
    pub value: Option<String>,
    pub filled: usize,
}

/// Outcome of [`crate::cleaner::DataCleaner::handle_missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingHandlingReport {
    pub strategy: MissingStrategy,
    pub threshold: f64,
    pub dropped_columns: Vec<String>,
    pub original_shape: (usize, usize),
    pub new_shape: (usize, usize),
    pub fills: Vec<ColumnFill>,
    /// Columns that still contain missing values after filling.
    pub unfilled_columns: Vec<String>,
    pub rows_dropped: usize,
    pub failures: Vec<ColumnFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtypeChange {
    pub column: String,
    pub from: String,
    pub to: String,
}

/// Outcome of [`crate::cleaner::DataCleaner::optimize_dtypes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtypeOptimization {
    pub memory_before_mb: f64,
    pub memory_after_mb: f64,
    pub reduction_percentage: f64,
    pub changes: Vec<DtypeChange>,
}

/// Everything the cleaner did, filled in as operations run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_types: Option<ColumnTypeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_handling: Option<MissingHandlingReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype_optimization: Option<DtypeOptimization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
}

/// Flagged values per numeric column. Data is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    /// Only columns with at least one flagged value.
    pub columns: Vec<ColumnOutliers>,
    pub failures: Vec<ColumnFailure>,
}

impl OutlierReport {
    pub fn column(&self, name: &str) -> Option<&ColumnOutliers> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn total_outliers(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Shape and composition of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
    /// Column count per polars dtype name.
    pub dtype_counts: BTreeMap<String, usize>,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub datetime_columns: usize,
    pub text_columns: usize,
}

/// Summary statistics of one numeric column, rounded to 2 decimals.
///
/// Statistics that are undefined for the sample size are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub missing_percentage: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub variance: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub unique_count: usize,
    /// Up to five most frequent values.
    pub top_values: Vec<ValueCount>,
    pub most_common: Option<String>,
    pub most_common_count: usize,
    /// Share of rows holding the most common value, in percent.
    pub concentration: f64,
}

/// Qualitative label for |r|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        let abs = r.abs();
        if abs >= 0.9 {
            Self::VeryStrong
        } else if abs >= 0.7 {
            Self::Strong
        } else if abs >= 0.5 {
            Self::Moderate
        } else if abs >= 0.3 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryStrong => "Very Strong",
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Weak => "Weak",
            Self::VeryWeak => "Very Weak",
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Square correlation matrix over numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `values[i][j]` is the coefficient of columns i and j.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongCorrelation {
    pub column_a: String,
    pub column_b: String,
    /// Rounded to 3 decimals.
    pub correlation: f64,
    pub strength: CorrelationStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    pub matrix: CorrelationMatrix,
    /// Pairs at or above the threshold, by descending |r|.
    pub strong_correlations: Vec<StrongCorrelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceEntry {
    pub column: String,
    pub variance: f64,
    pub std: f64,
    /// `|std / mean|`, undefined when the mean is zero.
    pub coefficient_of_variation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalityOutcome {
    Tested {
        statistic: f64,
        p_value: f64,
        is_normal: bool,
        sample_size: usize,
    },
    Untestable {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

/// Shapiro-Wilk result for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    pub column: String,
    #[serde(flatten)]
    pub outcome: NormalityOutcome,
}

impl NormalityResult {
    pub fn is_normal(&self) -> Option<bool> {
        match self.outcome {
            NormalityOutcome::Tested { is_normal, .. } => Some(is_normal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Flat,
    InsufficientData,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Flat => "flat",
            Self::InsufficientData => "insufficient data",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Daily trend of one numeric column against one datetime column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePattern {
    pub datetime_column: String,
    pub value_column: String,
    pub trend: TrendDirection,
    /// Least-squares slope per day; `None` with fewer than 2 days.
    pub slope: Option<f64>,
    pub date_range: Option<DateRange>,
    /// Number of days with at least one observation.
    pub periods: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Shape,
    MissingData,
    Identifier,
    Correlation,
    Variance,
}

/// A plain-language observation about the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// All analyzer outputs for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub basic_stats: BasicStats,
    pub descriptive_statistics: Vec<DescriptiveStats>,
    pub categorical_analysis: Vec<CategoricalSummary>,
    pub correlation: CorrelationResult,
    pub variance_analysis: Vec<VarianceEntry>,
    pub distribution_tests: Vec<NormalityResult>,
    pub time_patterns: Vec<TimePattern>,
    pub insights: Vec<Insight>,
}

// ============================================================================
// Chart data
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Distributions,
    Categorical,
    CorrelationHeatmap,
    Boxplots,
    ScatterMatrix,
    TimeSeries,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        Self::Distributions,
        Self::Categorical,
        Self::CorrelationHeatmap,
        Self::Boxplots,
        Self::ScatterMatrix,
        Self::TimeSeries,
    ];

    /// File stem of the written artifact.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Distributions => "distributions",
            Self::Categorical => "categorical",
            Self::CorrelationHeatmap => "correlation_heatmap",
            Self::Boxplots => "boxplots",
            Self::ScatterMatrix => "scatter_matrix",
            Self::TimeSeries => "time_series",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartStatus {
    Produced { path: PathBuf },
    NotProduced { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    #[serde(flatten)]
    pub status: ChartStatus,
}

impl ChartArtifact {
    pub fn is_produced(&self) -> bool {
        matches!(self.status, ChartStatus::Produced { .. })
    }
}

static_assertions::assert_impl_all!(LoadMetadata: Send, Sync);
static_assertions::assert_impl_all!(CleaningReport: Send, Sync);
static_assertions::assert_impl_all!(OutlierReport: Send, Sync);
static_assertions::assert_impl_all!(AnalysisBundle: Send, Sync);
static_assertions::assert_impl_all!(ChartArtifact: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_boundaries() {
        assert_eq!(CorrelationStrength::from_coefficient(0.9), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::from_coefficient(-0.95), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::from_coefficient(0.7), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(0.55), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(0.699), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(-0.3), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_coefficient(0.29), CorrelationStrength::VeryWeak);
    }

    #[test]
    fn test_strength_is_monotone_in_abs_r() {
        let mut previous = CorrelationStrength::VeryWeak;
        for step in 0..=100 {
            let r = step as f64 / 100.0;
            let strength = CorrelationStrength::from_coefficient(r);
            assert!(strength >= previous, "strength decreased at r = {}", r);
            assert_eq!(strength, CorrelationStrength::from_coefficient(-r));
            previous = strength;
        }
    }

    #[test]
    fn test_column_type_summary_lookup() {
        let mut summary = ColumnTypeSummary::default();
        summary.push(ColumnKind::Numeric, "age".to_string());
        summary.push(ColumnKind::Text, "notes".to_string());

        assert_eq!(summary.kind_of("age"), Some(ColumnKind::Numeric));
        assert_eq!(summary.kind_of("notes"), Some(ColumnKind::Text));
        assert_eq!(summary.kind_of("missing"), None);
        assert!(ColumnKind::Text.is_categorical_or_text());
        assert!(!ColumnKind::Datetime.is_categorical_or_text());
    }

    #[test]
    fn test_chart_artifact_serialization() {
        let artifact = ChartArtifact {
            kind: ChartKind::ScatterMatrix,
            status: ChartStatus::NotProduced {
                reason: "needs at least 2 numeric columns".to_string(),
            },
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["kind"], "scatter_matrix");
        assert_eq!(json["status"], "not_produced");
        assert!(!artifact.is_produced());
    }

    #[test]
    fn test_insight_display_is_message() {
        let insight = Insight {
            kind: InsightKind::Shape,
            message: "The dataset has 3 rows and 2 columns.".to_string(),
        };
        assert_eq!(insight.to_string(), "The dataset has 3 rows and 2 columns.");
    }
}
