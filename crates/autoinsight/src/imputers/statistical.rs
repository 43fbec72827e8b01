//! Statistical imputation methods.
//!
//! Each method fills the nulls of one column in place and records a
//! [`ColumnFill`] when something was filled. A column whose statistic does
//! not exist (all values missing) is left untouched and `Ok(false)` is
//! returned.

use crate::error::{InsightError, Result};
use crate::types::{ColumnFill, FillMethod};
use crate::utils::{fill_nulls_from_index, fill_numeric_nulls, fill_string_nulls, mode_index};
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a numeric column with its median.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let median = Self::series(df, col_name)?.median();
        match median {
            Some(value) => Self::fill_with_value(df, col_name, value, FillMethod::Median, fills),
            None => Ok(false),
        }
    }

    /// Fill a numeric column with its mean.
    pub fn apply_numeric_mean(
        df: &mut DataFrame,
        col_name: &str,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let mean = Self::series(df, col_name)?.mean();
        match mean {
            Some(value) => Self::fill_with_value(df, col_name, value, FillMethod::Mean, fills),
            None => Ok(false),
        }
    }

    /// Fill any column with its most frequent value, keeping the dtype.
    ///
    /// Ties go to the value seen first.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let series = Self::series(df, col_name)?.clone();
        let Some(index) = mode_index(&series)? else {
            return Ok(false);
        };

        let mode = series.get(index)?;
        let mode_value = mode.get_str().map(str::to_string).unwrap_or_else(|| mode.to_string());
        let filled = fill_nulls_from_index(&series, index)?;
        Self::replace(df, col_name, &series, filled, FillMethod::Mode, Some(mode_value), fills)
    }

    /// Fill a column with a constant string (the column becomes a String column).
    pub fn apply_constant_imputation(
        df: &mut DataFrame,
        col_name: &str,
        value: &str,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let series = Self::series(df, col_name)?.clone();
        let filled = fill_string_nulls(&series, value)?;
        Self::replace(
            df,
            col_name,
            &series,
            filled,
            FillMethod::Sentinel,
            Some(value.to_string()),
            fills,
        )
    }

    /// Carry the previous non-null value forward. Leading nulls stay null.
    pub fn apply_forward_fill(
        df: &mut DataFrame,
        col_name: &str,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let series = Self::series(df, col_name)?.clone();
        let filled = series.fill_null(FillNullStrategy::Forward(None))?;
        Self::replace(df, col_name, &series, filled, FillMethod::ForwardFill, None, fills)
    }

    fn series<'a>(df: &'a DataFrame, col_name: &str) -> Result<&'a Series> {
        df.column(col_name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| InsightError::ColumnNotFound(col_name.to_string()))
    }

    /// Fill numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        method: FillMethod,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let series = Self::series(df, col_name)?.clone();
        let filled = fill_numeric_nulls(&series, fill_value)?;
        Self::replace(
            df,
            col_name,
            &series,
            filled,
            method,
            Some(format!("{}", fill_value)),
            fills,
        )
    }

    fn replace(
        df: &mut DataFrame,
        col_name: &str,
        before: &Series,
        filled: Series,
        method: FillMethod,
        value: Option<String>,
        fills: &mut Vec<ColumnFill>,
    ) -> Result<bool> {
        let count = before.null_count().saturating_sub(filled.null_count());
        if count == 0 {
            return Ok(false);
        }
        df.replace(col_name, filled)?;
        fills.push(ColumnFill {
            column: col_name.to_string(),
            method,
            value,
            filled: count,
        });
        Ok(true)
    }
}
