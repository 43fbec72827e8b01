//! Missing-value profiling and handling.

use crate::config::MissingStrategy;
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::types::{ColumnFailure, ColumnFill, ColumnKind, ColumnMissing, ColumnTypeSummary, MissingReport};
use crate::utils::{UNKNOWN_SENTINEL, is_string_dtype, percentage};
use polars::prelude::*;
use tracing::{debug, warn};

/// Profile the missing values of a table.
pub(super) fn analyze(df: &DataFrame) -> MissingReport {
    let rows = df.height();
    let total_cells = rows * df.width();

    let columns: Vec<ColumnMissing> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| ColumnMissing {
            column: c.name().to_string(),
            count: c.null_count(),
            percentage: percentage(c.null_count(), rows),
        })
        .collect();
    let missing_cells = columns.iter().map(|c| c.count).sum();

    MissingReport {
        total_cells,
        missing_cells,
        missing_percentage: percentage(missing_cells, total_cells),
        columns,
    }
}

/// Columns whose missing fraction is strictly above `threshold`.
///
/// The fraction of an empty table is 0, so nothing is dropped from it.
pub(super) fn columns_over_threshold(df: &DataFrame, threshold: f64) -> Vec<String> {
    let rows = df.height();
    if rows == 0 {
        return Vec::new();
    }
    df.get_columns()
        .iter()
        .filter(|c| c.null_count() as f64 / rows as f64 > threshold)
        .map(|c| c.name().to_string())
        .collect()
}

/// What the fill pass did.
#[derive(Debug, Default)]
pub(super) struct FillOutcome {
    pub fills: Vec<ColumnFill>,
    pub failures: Vec<ColumnFailure>,
    pub rows_dropped: usize,
}

/// Fill the remaining missing values of `df` per `strategy`.
///
/// Per-column failures are collected and do not stop the other columns.
pub(super) fn fill(
    df: &mut DataFrame,
    strategy: MissingStrategy,
    kinds: &ColumnTypeSummary,
) -> Result<FillOutcome> {
    let mut outcome = FillOutcome::default();

    if strategy == MissingStrategy::Drop {
        let before = df.height();
        *df = df.drop_nulls::<String>(None)?;
        outcome.rows_dropped = before - df.height();
        debug!("Dropped {} rows with missing values", outcome.rows_dropped);
        return Ok(outcome);
    }

    let with_missing: Vec<(String, DataType)> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| (c.name().to_string(), c.dtype().clone()))
        .collect();

    for (name, dtype) in with_missing {
        let kind = kinds.kind_of(&name);
        let result = fill_column(df, &name, &dtype, kind, strategy, &mut outcome.fills);
        if let Err(e) = result {
            warn!("Failed to fill missing values in '{}': {}", name, e);
            outcome.failures.push(ColumnFailure::new(name, e));
        }
    }

    Ok(outcome)
}

fn fill_column(
    df: &mut DataFrame,
    name: &str,
    dtype: &DataType,
    kind: Option<ColumnKind>,
    strategy: MissingStrategy,
    fills: &mut Vec<ColumnFill>,
) -> Result<()> {
    let numeric = kind == Some(ColumnKind::Numeric);

    match strategy {
        MissingStrategy::Auto => {
            if numeric {
                StatisticalImputer::apply_numeric_median(df, name, fills)?;
            } else {
                let filled = StatisticalImputer::apply_mode_imputation(df, name, fills)?;
                if !filled && (is_string_dtype(dtype) || matches!(dtype, DataType::Null)) {
                    StatisticalImputer::apply_constant_imputation(df, name, UNKNOWN_SENTINEL, fills)?;
                }
            }
        }
        MissingStrategy::Mean if numeric => {
            StatisticalImputer::apply_numeric_mean(df, name, fills)?;
        }
        MissingStrategy::Median if numeric => {
            StatisticalImputer::apply_numeric_median(df, name, fills)?;
        }
        MissingStrategy::Mean | MissingStrategy::Median => {}
        MissingStrategy::Mode => {
            StatisticalImputer::apply_mode_imputation(df, name, fills)?;
        }
        MissingStrategy::ForwardFill => {
            StatisticalImputer::apply_forward_fill(df, name, fills)?;
        }
        MissingStrategy::Drop => {}
    }
    Ok(())
}

/// Columns that still hold at least one missing value, in table order.
pub(super) fn unfilled_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| c.name().to_string())
        .collect()
}
