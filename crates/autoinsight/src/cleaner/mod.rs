//! Data cleaning module.
//!
//! This module provides functionality for:
//! - Profiling missing values
//! - Classifying columns into numeric, categorical, datetime and text
//! - Dropping columns with high missing rates and filling the rest
//! - Flagging outliers (IQR or z-score)
//! - Lossless dtype downcasting
//!
//! [`DataCleaner`] owns a working copy of the input table; the caller's frame
//! is never modified.

mod dtypes;
mod missing;
mod outliers;

pub(crate) use outliers::iqr_outliers;

use crate::config::{MissingStrategy, OutlierMethod};
use crate::error::{InsightError, Result};
use crate::types::{
    CleaningReport, ColumnTypeSummary, DtypeOptimization, MissingHandlingReport, MissingReport,
    OutlierReport,
};
use crate::utils::classify_columns;
use polars::prelude::*;
use tracing::{debug, info};

/// Data cleaner holding its own copy of a table plus a running report.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    df: DataFrame,
    report: CleaningReport,
}

impl DataCleaner {
    /// Create a cleaner over a copy of `df`.
    pub fn new(df: &DataFrame) -> Self {
        Self {
            df: df.clone(),
            report: CleaningReport::default(),
        }
    }

    /// Missing-value profile of the current working table.
    pub fn analyze_missing(&self) -> MissingReport {
        missing::analyze(&self.df)
    }

    /// Classify the current columns and record the result in the report.
    pub fn detect_column_types(&mut self) -> ColumnTypeSummary {
        let summary = classify_columns(&self.df);
        debug!(
            "Column types: {} numeric, {} categorical, {} datetime, {} text",
            summary.numeric.len(),
            summary.categorical.len(),
            summary.datetime.len(),
            summary.text.len()
        );
        self.report.column_types = Some(summary.clone());
        summary
    }

    /// Drop columns whose missing fraction exceeds `threshold`, then fill the
    /// remaining missing values per `strategy`.
    ///
    /// The column drop always happens, whatever the strategy. Columns that
    /// cannot be filled (no median, mean or mode) stay missing and are listed
    /// in `unfilled_columns`.
    pub fn handle_missing(&mut self, strategy: MissingStrategy, threshold: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InsightError::InvalidConfig(format!(
                "missing-value threshold must be between 0 and 1, got {}",
                threshold
            )));
        }

        let original_shape = self.df.shape();

        let dropped_columns = missing::columns_over_threshold(&self.df, threshold);
        if !dropped_columns.is_empty() {
            let names: Vec<PlSmallStr> = dropped_columns.iter().map(|s| s.as_str().into()).collect();
            self.df = self.df.drop_many(names);
            info!(
                "Dropped {} columns with more than {:.0}% missing: {:?}",
                dropped_columns.len(),
                threshold * 100.0,
                dropped_columns
            );
        }

        let kinds = classify_columns(&self.df);
        let outcome = missing::fill(&mut self.df, strategy, &kinds)?;
        let unfilled_columns = missing::unfilled_columns(&self.df);

        let new_shape = self.df.shape();
        info!(
            "Missing-value handling ({}) complete: {:?} -> {:?}",
            strategy, original_shape, new_shape
        );

        self.report.missing_handling = Some(MissingHandlingReport {
            strategy,
            threshold,
            dropped_columns,
            original_shape,
            new_shape,
            fills: outcome.fills,
            unfilled_columns,
            rows_dropped: outcome.rows_dropped,
            failures: outcome.failures,
        });
        Ok(())
    }

    /// Flag outliers in every numeric column. The data is not modified.
    pub fn detect_outliers(&self, method: OutlierMethod) -> OutlierReport {
        let report = outliers::detect(&self.df, method);
        debug!(
            "Outlier detection ({}): {} values in {} columns",
            method,
            report.total_outliers(),
            report.columns.len()
        );
        report
    }

    /// Downcast numeric columns where no value changes.
    pub fn optimize_dtypes(&mut self) -> Result<DtypeOptimization> {
        let optimization = dtypes::optimize(&mut self.df)?;
        info!(
            "Dtype optimization: {:.3} MB -> {:.3} MB ({} columns changed)",
            optimization.memory_before_mb,
            optimization.memory_after_mb,
            optimization.changes.len()
        );
        self.report.dtype_optimization = Some(optimization.clone());
        Ok(optimization)
    }

    /// Copy of the current working table.
    pub fn cleaned_data(&self) -> DataFrame {
        self.df.clone()
    }

    /// Borrow the current working table.
    pub fn data(&self) -> &DataFrame {
        &self.df
    }

    pub fn report(&self) -> &CleaningReport {
        &self.report
    }

    pub fn into_parts(self) -> (DataFrame, CleaningReport) {
        (self.df, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnKind, FillMethod};
    use pretty_assertions::assert_eq;

    fn scenario_frame() -> DataFrame {
        df![
            "a" => [Some(1i64), Some(2), Some(3), None, Some(5)],
            "b" => [Some("x"), Some("x"), Some("y"), Some("y"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_auto_fills_median_and_first_seen_mode() {
        let df = scenario_frame();
        let mut cleaner = DataCleaner::new(&df);
        cleaner.handle_missing(MissingStrategy::Auto, 0.5).unwrap();

        let cleaned = cleaner.cleaned_data();
        let a = cleaned.column("a").unwrap().as_materialized_series();
        let b = cleaned.column("b").unwrap().as_materialized_series();
        assert_eq!(a.get(3).unwrap().try_extract::<f64>().unwrap(), 2.5);
        assert_eq!(b.str().unwrap().get(4), Some("x"));

        let report = cleaner.report().missing_handling.as_ref().unwrap();
        assert!(report.dropped_columns.is_empty());
        assert_eq!(report.original_shape, (5, 2));
        assert_eq!(report.new_shape, (5, 2));
        assert_eq!(report.fills[0].method, FillMethod::Median);
        assert_eq!(report.fills[1].method, FillMethod::Mode);
        assert!(report.unfilled_columns.is_empty());

        // input untouched
        assert_eq!(df.column("a").unwrap().null_count(), 1);
    }

    #[test]
    fn test_low_threshold_drops_every_column() {
        let mut cleaner = DataCleaner::new(&scenario_frame());
        cleaner.handle_missing(MissingStrategy::Auto, 0.1).unwrap();

        assert_eq!(cleaner.data().width(), 0);
        let report = cleaner.report().missing_handling.as_ref().unwrap();
        assert_eq!(report.dropped_columns, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_threshold_invariant_holds_for_every_strategy() {
        let df = df![
            "mostly_missing" => [Some(1.0), None, None, None],
            "some_missing" => [Some(1.0), None, Some(3.0), Some(4.0)],
            "text" => [Some("p"), Some("q"), None, Some("p")],
        ]
        .unwrap();

        for strategy in [
            MissingStrategy::Auto,
            MissingStrategy::Drop,
            MissingStrategy::Mean,
            MissingStrategy::Median,
            MissingStrategy::Mode,
            MissingStrategy::ForwardFill,
        ] {
            let mut cleaner = DataCleaner::new(&df);
            cleaner.handle_missing(strategy, 0.5).unwrap();
            let data = cleaner.data();
            assert!(data.column("mostly_missing").is_err(), "{}", strategy);
            for column in data.get_columns() {
                let fraction = if data.height() == 0 {
                    0.0
                } else {
                    column.null_count() as f64 / data.height() as f64
                };
                assert!(fraction <= 0.5, "{} left {}", strategy, column.name());
            }
        }
    }

    #[test]
    fn test_auto_and_drop_leave_no_missing_values() {
        let df = df![
            "n" => [Some(1.0), None, Some(3.0), Some(3.0)],
            "s" => [None, Some("a"), Some("b"), Some("a")],
        ]
        .unwrap();

        for strategy in [MissingStrategy::Auto, MissingStrategy::Drop] {
            let mut cleaner = DataCleaner::new(&df);
            cleaner.handle_missing(strategy, 0.5).unwrap();
            assert_eq!(cleaner.analyze_missing().missing_cells, 0, "{}", strategy);
        }
    }

    #[test]
    fn test_statistical_strategies_fill_their_columns() {
        let df = df![
            "n" => [Some(1.0), None, Some(3.0), Some(3.0)],
            "i" => [None, Some(2i64), Some(2), Some(5)],
            "s" => [None, Some("a"), Some("b"), Some("a")],
        ]
        .unwrap();

        let numeric_only = ["n", "i"];
        for (strategy, filled) in [
            (MissingStrategy::Mean, &numeric_only[..]),
            (MissingStrategy::Median, &numeric_only[..]),
            (MissingStrategy::Mode, &["n", "i", "s"][..]),
        ] {
            let mut cleaner = DataCleaner::new(&df);
            cleaner.handle_missing(strategy, 0.5).unwrap();
            let data = cleaner.data();
            for name in filled {
                assert_eq!(data.column(name).unwrap().null_count(), 0, "{} {}", strategy, name);
            }
            assert_eq!(data.height(), 4, "{}", strategy);
        }

        // mean and median leave strings alone
        let mut cleaner = DataCleaner::new(&df);
        cleaner.handle_missing(MissingStrategy::Median, 0.5).unwrap();
        assert_eq!(cleaner.data().column("s").unwrap().null_count(), 1);
    }

    #[test]
    fn test_analyze_missing_is_idempotent() {
        let cleaner = DataCleaner::new(&scenario_frame());
        assert_eq!(cleaner.analyze_missing(), cleaner.analyze_missing());
    }

    #[test]
    fn test_detect_column_types_is_recorded() {
        let mut cleaner = DataCleaner::new(&scenario_frame());
        let summary = cleaner.detect_column_types();
        assert_eq!(summary.kind_of("a"), Some(ColumnKind::Numeric));
        assert_eq!(summary.kind_of("b"), Some(ColumnKind::Categorical));
        assert_eq!(cleaner.report().column_types.as_ref(), Some(&summary));
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let mut cleaner = DataCleaner::new(&scenario_frame());
        let err = cleaner.handle_missing(MissingStrategy::Auto, 1.5).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_empty_table_does_not_fail() {
        let mut cleaner = DataCleaner::new(&DataFrame::empty());
        cleaner.detect_column_types();
        cleaner.handle_missing(MissingStrategy::Auto, 0.5).unwrap();
        assert!(cleaner.detect_outliers(OutlierMethod::Iqr).columns.is_empty());
        cleaner.optimize_dtypes().unwrap();
    }

    #[test]
    fn test_outliers_agree_on_extreme_value() {
        let df = df!["v" => [10.0, 12.0, 11.0, 13.0, 1000.0]].unwrap();
        let cleaner = DataCleaner::new(&df);

        for method in [OutlierMethod::Iqr, OutlierMethod::ZScore] {
            let report = cleaner.detect_outliers(method);
            assert_eq!(report.column("v").map(|c| c.count), Some(1), "{}", method);
        }
        assert_eq!(cleaner.data().column("v").unwrap().len(), 5);
    }
}
