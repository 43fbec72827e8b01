//! Statistical analysis of a cleaned table.
//!
//! [`DataAnalyzer`] borrows a DataFrame, classifies its columns once at
//! construction, and exposes one method per analysis. Every method returns
//! owned value types and yields an empty result when the table has no
//! columns of the kind it needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoinsight::{DataAnalyzer, CorrelationMethod};
//!
//! let analyzer = DataAnalyzer::new(&df);
//! let correlations = analyzer.correlation_analysis(CorrelationMethod::Spearman, 0.5);
//! for insight in analyzer.generate_insights() {
//!     println!("{}", insight);
//! }
//! ```

mod correlation;
mod descriptive;
mod distribution;
mod insights;
mod time_series;

use crate::config::CorrelationConfig;
use crate::error::{InsightError, Result, ResultExt};
use crate::types::{AnalysisBundle, BasicStats, ColumnKind, ColumnTypeSummary};
use crate::utils::{classify_columns, frame_memory_mb, numeric_options, numeric_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Read-only analyzer over a borrowed table.
#[derive(Debug, Clone)]
pub struct DataAnalyzer<'a> {
    df: &'a DataFrame,
    kinds: ColumnTypeSummary,
}

impl<'a> DataAnalyzer<'a> {
    pub fn new(df: &'a DataFrame) -> Self {
        let kinds = classify_columns(df);
        debug!(
            "Analyzer: {} numeric, {} categorical, {} datetime, {} text columns",
            kinds.numeric.len(),
            kinds.categorical.len(),
            kinds.datetime.len(),
            kinds.text.len()
        );
        Self { df, kinds }
    }

    pub fn column_types(&self) -> &ColumnTypeSummary {
        &self.kinds
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.kinds.numeric
    }

    /// Categorical and text columns, in table order.
    pub fn categorical_or_text_columns(&self) -> Vec<&str> {
        self.df
            .get_column_names_str()
            .into_iter()
            .filter(|name| {
                self.kinds
                    .kind_of(name)
                    .is_some_and(|kind| kind.is_categorical_or_text())
            })
            .collect()
    }

    /// Shape, memory and column composition of the table.
    pub fn basic_stats(&self) -> BasicStats {
        let mut dtype_counts = BTreeMap::new();
        for column in self.df.get_columns() {
            *dtype_counts.entry(column.dtype().to_string()).or_insert(0) += 1;
        }

        BasicStats {
            rows: self.df.height(),
            columns: self.df.width(),
            memory_mb: frame_memory_mb(self.df),
            dtype_counts,
            numeric_columns: self.kinds.columns_of(ColumnKind::Numeric).len(),
            categorical_columns: self.kinds.columns_of(ColumnKind::Categorical).len(),
            datetime_columns: self.kinds.columns_of(ColumnKind::Datetime).len(),
            text_columns: self.kinds.columns_of(ColumnKind::Text).len(),
        }
    }

    /// Run every analysis with the given correlation settings.
    pub fn analyze_all(&self, correlation: &CorrelationConfig, variance_top_n: usize) -> AnalysisBundle {
        AnalysisBundle {
            basic_stats: self.basic_stats(),
            descriptive_statistics: self.descriptive_statistics(),
            categorical_analysis: self.categorical_analysis(),
            correlation: self.correlation_analysis(correlation.method, correlation.threshold),
            variance_analysis: self.variance_analysis(variance_top_n),
            distribution_tests: self.distribution_tests(),
            time_patterns: self.detect_time_patterns(),
            insights: self.generate_insights(),
        }
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| InsightError::ColumnNotFound(name.to_string()))
    }

    /// Non-null values of a numeric column.
    fn values(&self, name: &str) -> Result<Vec<f64>> {
        numeric_values(self.series(name)?).context(format!("reading column '{}'", name))
    }

    /// Values of a numeric column with nulls kept in place.
    fn options(&self, name: &str) -> Result<Vec<Option<f64>>> {
        numeric_options(self.series(name)?).context(format!("reading column '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorrelationMethod;

    #[test]
    fn test_basic_stats() {
        let df = df![
            "n" => [1.0, 2.0, 3.0],
            "i" => [1i64, 2, 3],
            "s" => ["a", "b", "a"],
        ]
        .unwrap();

        let stats = DataAnalyzer::new(&df).basic_stats();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.columns, 3);
        assert_eq!(stats.numeric_columns, 2);
        assert_eq!(stats.categorical_columns, 1);
        assert_eq!(stats.dtype_counts.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_empty_table_gives_empty_results() {
        let df = DataFrame::empty();
        let analyzer = DataAnalyzer::new(&df);
        let bundle = analyzer.analyze_all(
            &CorrelationConfig {
                method: CorrelationMethod::Kendall,
                threshold: 0.5,
            },
            10,
        );

        assert!(bundle.descriptive_statistics.is_empty());
        assert!(bundle.categorical_analysis.is_empty());
        assert!(bundle.correlation.matrix.is_empty());
        assert!(bundle.variance_analysis.is_empty());
        assert!(bundle.distribution_tests.is_empty());
        assert!(bundle.time_patterns.is_empty());
        assert_eq!(bundle.insights.len(), 1);
    }

    #[test]
    fn test_categorical_or_text_columns_keep_table_order() {
        let ids: Vec<String> = (0..25).map(|i| format!("row-{}", i)).collect();
        let df = df![
            "id" => ids,
            "v" => (0..25).map(|i| i as f64).collect::<Vec<_>>(),
            "group" => (0..25).map(|i| if i < 10 { "a" } else { "b" }).collect::<Vec<_>>(),
        ]
        .unwrap();

        let analyzer = DataAnalyzer::new(&df);
        assert_eq!(analyzer.categorical_or_text_columns(), vec!["id", "group"]);
        assert_eq!(analyzer.column_types().text, vec!["id"]);
    }
}
