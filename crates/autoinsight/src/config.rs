//! Configuration types for the analysis pipeline.
//!
//! Strategy and method enums parse from the lowercase names used by callers
//! (`"auto"`, `"forward_fill"`, `"zscore"`, `"kendall"`, ...) so that invalid
//! names are rejected before any computation starts. [`AnalysisConfig`] uses
//! the builder pattern for ergonomic pipeline setup.

use crate::error::InsightError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Package tier of the caller. Drives the upload size limit and which
/// outputs are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageTier {
    /// 1 MB limit, no full report
    #[default]
    Free,
    /// 25 MB limit, full report
    Pro,
    /// 200 MB limit, full report
    Business,
}

impl PackageTier {
    /// Maximum input file size in megabytes.
    pub fn limit_mb(&self) -> f64 {
        match self {
            Self::Free => 1.0,
            Self::Pro => 25.0,
            Self::Business => 200.0,
        }
    }

    /// Maximum input file size in bytes.
    pub fn limit_bytes(&self) -> u64 {
        (self.limit_mb() * BYTES_PER_MB) as u64
    }

    /// Whether the tier includes the comprehensive report document.
    pub fn supports_full_report(&self) -> bool {
        !matches!(self, Self::Free)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageTier {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "business" => Ok(Self::Business),
            other => Err(InsightError::InvalidConfig(format!(
                "unknown package tier '{}' (expected free, pro or business)",
                other
            ))),
        }
    }
}

/// Strategy for filling the missing values left after the column-drop pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Median for numeric columns, mode (or "Unknown") for the rest
    #[default]
    Auto,
    /// Drop rows that still contain a missing value
    Drop,
    /// Mean for numeric columns, others untouched
    Mean,
    /// Median for numeric columns, others untouched
    Median,
    /// Mode for every column
    Mode,
    /// Previous non-missing value in row order
    ForwardFill,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Drop => "drop",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::ForwardFill => "forward_fill",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingStrategy {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "drop" => Ok(Self::Drop),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "forward_fill" | "ffill" => Ok(Self::ForwardFill),
            other => Err(InsightError::InvalidConfig(format!(
                "unknown missing-value strategy '{}' (expected auto, drop, mean, median, mode or forward_fill)",
                other
            ))),
        }
    }
}

/// Method used to flag outliers in numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Values outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    #[default]
    Iqr,
    /// Values more than 3 standard deviations from the mean
    ZScore,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutlierMethod {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" | "z_score" => Ok(Self::ZScore),
            other => Err(InsightError::InvalidConfig(format!(
                "unknown outlier method '{}' (expected iqr or zscore)",
                other
            ))),
        }
    }
}

/// Correlation coefficient used for the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(InsightError::InvalidConfig(format!(
                "unknown correlation method '{}' (expected pearson, spearman or kendall)",
                other
            ))),
        }
    }
}

/// Missing-value handling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaningConfig {
    pub strategy: MissingStrategy,
    /// Columns with a missing fraction above this value (0.0 - 1.0) are dropped.
    pub threshold: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            strategy: MissingStrategy::Auto,
            threshold: 0.5,
        }
    }
}

/// Correlation analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    pub method: CorrelationMethod,
    /// Minimum absolute coefficient for a pair to be listed.
    pub threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            method: CorrelationMethod::Pearson,
            threshold: 0.5,
        }
    }
}

/// Configuration for a full analysis run.
///
/// Use [`AnalysisConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autoinsight::config::{AnalysisConfig, MissingStrategy, PackageTier};
///
/// let config = AnalysisConfig::builder()
///     .tier(PackageTier::Pro)
///     .missing_strategy(MissingStrategy::Median)
///     .missing_threshold(0.4)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Package tier (size limit, report availability).
    /// Default: Free
    pub tier: PackageTier,

    /// Missing-value handling.
    /// Default: auto, threshold 0.5
    pub cleaning: CleaningConfig,

    /// Outlier detection method.
    /// Default: Iqr
    pub outlier_method: OutlierMethod,

    /// Correlation method and listing threshold.
    /// Default: pearson, 0.5
    pub correlation: CorrelationConfig,

    /// Number of columns reported by the variance ranking.
    /// Default: 10
    pub variance_top_n: usize,

    /// Downcast numeric dtypes after cleaning.
    /// Default: false
    pub optimize_dtypes: bool,

    /// Directory for chart data and report files.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Whether to write chart data artifacts.
    /// Default: false
    pub generate_charts: bool,

    /// Whether to write the comprehensive JSON report.
    /// Default: false
    pub emit_report: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tier: PackageTier::default(),
            cleaning: CleaningConfig::default(),
            outlier_method: OutlierMethod::default(),
            correlation: CorrelationConfig::default(),
            variance_top_n: 10,
            optimize_dtypes: false,
            output_dir: PathBuf::from("outputs"),
            generate_charts: false,
            emit_report: false,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.cleaning.threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "cleaning.threshold".to_string(),
                value: self.cleaning.threshold,
            });
        }

        if !(0.0..=1.0).contains(&self.correlation.threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "correlation.threshold".to_string(),
                value: self.correlation.threshold,
            });
        }

        if self.variance_top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.variance_top_n));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid variance top-n: {0} (must be at least 1)")]
    InvalidTopN(usize),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    tier: Option<PackageTier>,
    missing_strategy: Option<MissingStrategy>,
    missing_threshold: Option<f64>,
    outlier_method: Option<OutlierMethod>,
    correlation_method: Option<CorrelationMethod>,
    correlation_threshold: Option<f64>,
    variance_top_n: Option<usize>,
    optimize_dtypes: Option<bool>,
    output_dir: Option<PathBuf>,
    generate_charts: Option<bool>,
    emit_report: Option<bool>,
}

impl AnalysisConfigBuilder {
    /// Set the package tier.
    pub fn tier(mut self, tier: PackageTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Set the missing-value fill strategy.
    pub fn missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Set the column drop threshold.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.5 = 50%)
    pub fn missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = Some(threshold);
        self
    }

    /// Set the outlier detection method.
    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Set the correlation coefficient.
    pub fn correlation_method(mut self, method: CorrelationMethod) -> Self {
        self.correlation_method = Some(method);
        self
    }

    /// Set the minimum absolute correlation for listed pairs.
    pub fn correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = Some(threshold);
        self
    }

    /// Set how many columns the variance ranking reports.
    pub fn variance_top_n(mut self, top_n: usize) -> Self {
        self.variance_top_n = Some(top_n);
        self
    }

    /// Enable or disable dtype downcasting after cleaning.
    pub fn optimize_dtypes(mut self, optimize: bool) -> Self {
        self.optimize_dtypes = Some(optimize);
        self
    }

    /// Set the output directory for chart data and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable chart data export.
    pub fn generate_charts(mut self, generate: bool) -> Self {
        self.generate_charts = Some(generate);
        self
    }

    /// Enable or disable the comprehensive JSON report.
    pub fn emit_report(mut self, emit: bool) -> Self {
        self.emit_report = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let correlation_defaults = CorrelationConfig::default();

        let config = AnalysisConfig {
            tier: self.tier.unwrap_or_default(),
            cleaning: CleaningConfig {
                strategy: self.missing_strategy.unwrap_or(defaults.strategy),
                threshold: self.missing_threshold.unwrap_or(defaults.threshold),
            },
            outlier_method: self.outlier_method.unwrap_or_default(),
            correlation: CorrelationConfig {
                method: self
                    .correlation_method
                    .unwrap_or(correlation_defaults.method),
                threshold: self
                    .correlation_threshold
                    .unwrap_or(correlation_defaults.threshold),
            },
            variance_top_n: self.variance_top_n.unwrap_or(10),
            optimize_dtypes: self.optimize_dtypes.unwrap_or(false),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("outputs")),
            generate_charts: self.generate_charts.unwrap_or(false),
            emit_report: self.emit_report.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.tier, PackageTier::Free);
        assert_eq!(config.cleaning.strategy, MissingStrategy::Auto);
        assert_eq!(config.cleaning.threshold, 0.5);
        assert_eq!(config.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.correlation.method, CorrelationMethod::Pearson);
        assert_eq!(config.variance_top_n, 10);
        assert!(!config.generate_charts);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .tier(PackageTier::Business)
            .missing_strategy(MissingStrategy::ForwardFill)
            .missing_threshold(0.3)
            .outlier_method(OutlierMethod::ZScore)
            .correlation_method(CorrelationMethod::Kendall)
            .correlation_threshold(0.8)
            .variance_top_n(3)
            .build()
            .unwrap();

        assert_eq!(config.tier, PackageTier::Business);
        assert_eq!(config.cleaning.strategy, MissingStrategy::ForwardFill);
        assert_eq!(config.cleaning.threshold, 0.3);
        assert_eq!(config.outlier_method, OutlierMethod::ZScore);
        assert_eq!(config.correlation.method, CorrelationMethod::Kendall);
        assert_eq!(config.correlation.threshold, 0.8);
        assert_eq!(config.variance_top_n, 3);
    }

    #[test]
    fn test_validation_invalid_missing_threshold() {
        let result = AnalysisConfig::builder().missing_threshold(1.5).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_top_n() {
        let result = AnalysisConfig::builder().variance_top_n(0).build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTopN(0)
        ));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("auto".parse::<MissingStrategy>().unwrap(), MissingStrategy::Auto);
        assert_eq!(
            "Forward_Fill".parse::<MissingStrategy>().unwrap(),
            MissingStrategy::ForwardFill
        );
        assert_eq!("ffill".parse::<MissingStrategy>().unwrap(), MissingStrategy::ForwardFill);

        let err = "interpolate".parse::<MissingStrategy>().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("interpolate"));
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("zscore".parse::<OutlierMethod>().unwrap(), OutlierMethod::ZScore);
        assert_eq!(
            "spearman".parse::<CorrelationMethod>().unwrap(),
            CorrelationMethod::Spearman
        );
        assert!("cosine".parse::<CorrelationMethod>().is_err());
        assert!("mad".parse::<OutlierMethod>().is_err());
    }

    #[test]
    fn test_tier_limits() {
        assert_eq!(PackageTier::Free.limit_bytes(), 1024 * 1024);
        assert_eq!(PackageTier::Pro.limit_mb(), 25.0);
        assert_eq!(PackageTier::Business.limit_mb(), 200.0);
        assert!(!PackageTier::Free.supports_full_report());
        assert!(PackageTier::Pro.supports_full_report());
        assert!("enterprise".parse::<PackageTier>().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "tier": "pro",
            "cleaning": { "strategy": "forward_fill", "threshold": 0.25 },
            "outlier_method": "zscore",
            "correlation": { "method": "spearman", "threshold": 0.6 },
            "variance_top_n": 5,
            "optimize_dtypes": true,
            "output_dir": "custom_output",
            "generate_charts": true,
            "emit_report": false
        }"#;

        let config: AnalysisConfig =
            serde_json::from_str(json).expect("Should deserialize from frontend JSON");

        assert_eq!(config.tier, PackageTier::Pro);
        assert_eq!(config.cleaning.strategy, MissingStrategy::ForwardFill);
        assert_eq!(config.cleaning.threshold, 0.25);
        assert_eq!(config.outlier_method, OutlierMethod::ZScore);
        assert_eq!(config.correlation.method, CorrelationMethod::Spearman);
        assert!(config.optimize_dtypes);
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
    }
}
