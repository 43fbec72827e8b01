//! Outlier flagging for numeric columns. Read-only: values are counted,
//! never modified.

use crate::config::OutlierMethod;
use crate::stats::{quantile_sorted, sorted};
use crate::types::{ColumnFailure, ColumnOutliers, OutlierReport};
use crate::utils::{is_numeric_dtype, numeric_values, percentage};
use polars::prelude::*;
use tracing::debug;

const IQR_MULTIPLIER: f64 = 1.5;
const ZSCORE_THRESHOLD: f64 = 3.0;

/// Flagged-value count and IQR bounds (when applicable) for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Flagged {
    pub count: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`.
pub(crate) fn iqr_outliers(values: &[f64]) -> Flagged {
    let s = sorted(values);
    let (Some(q1), Some(q3)) = (quantile_sorted(&s, 0.25), quantile_sorted(&s, 0.75)) else {
        return Flagged {
            count: 0,
            lower: None,
            upper: None,
        };
    };
    let iqr = q3 - q1;
    let lower = q1 - IQR_MULTIPLIER * iqr;
    let upper = q3 + IQR_MULTIPLIER * iqr;
    let count = values.iter().filter(|v| **v < lower || **v > upper).count();
    Flagged {
        count,
        lower: Some(lower),
        upper: Some(upper),
    }
}

/// Values whose distance from the mean of the *other* values exceeds three
/// standard deviations of those other values.
///
/// Needs at least 3 values. When the other values are all equal, the point
/// is flagged exactly when it differs from them.
pub(crate) fn zscore_outliers(values: &[f64]) -> Flagged {
    let n = values.len();
    let none = Flagged {
        count: 0,
        lower: None,
        upper: None,
    };
    if n < 3 {
        return none;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let total_ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if total_ss == 0.0 {
        return none;
    }

    let rest = (n - 1) as f64;
    let count = values
        .iter()
        .filter(|v| {
            let d = **v - mean;
            // mean and sum of squares of the other n-1 values, relative to `mean`
            let distance = d.abs() * n as f64 / rest;
            let rest_ss = (total_ss - d * d - d * d / rest).max(0.0);
            let rest_std = (rest_ss / (rest - 1.0)).sqrt();
            if rest_std == 0.0 || rest_ss <= total_ss * f64::EPSILON {
                distance > 0.0
            } else {
                distance / rest_std > ZSCORE_THRESHOLD
            }
        })
        .count();

    Flagged {
        count,
        lower: None,
        upper: None,
    }
}

/// Flag outliers in every numeric column of `df`.
pub(super) fn detect(df: &DataFrame, method: OutlierMethod) -> OutlierReport {
    let rows = df.height();
    let mut columns = Vec::new();
    let mut failures = Vec::new();

    for column in df.get_columns() {
        if !is_numeric_dtype(column.dtype()) {
            continue;
        }
        let name = column.name().to_string();
        let values = match numeric_values(column.as_materialized_series()) {
            Ok(values) => values,
            Err(e) => {
                failures.push(ColumnFailure::new(name, e));
                continue;
            }
        };

        let flagged = match method {
            OutlierMethod::Iqr => iqr_outliers(&values),
            OutlierMethod::ZScore => zscore_outliers(&values),
        };

        if flagged.count > 0 {
            debug!("{} outliers in '{}' ({})", flagged.count, name, method);
            columns.push(ColumnOutliers {
                column: name,
                count: flagged.count,
                percentage: percentage(flagged.count, rows),
                lower_bound: flagged.lower,
                upper_bound: flagged.upper,
            });
        }
    }

    OutlierReport {
        method,
        columns,
        failures,
    }
}
