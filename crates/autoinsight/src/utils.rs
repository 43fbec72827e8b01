//! Shared utilities for the analysis pipeline.
//!
//! This module contains the dtype helpers, column classification and the
//! Series extraction and filling functions used by the cleaner, analyzer and
//! chart exporter.

use crate::types::{ColumnKind, ColumnTypeSummary, ValueCount};
use polars::prelude::*;
use std::collections::HashMap;

/// A string column is categorical when its distinct count is below this
/// fraction of the row count.
pub const CATEGORICAL_RATIO: f64 = 0.05;

/// A string column is categorical when it has fewer distinct values than this.
pub const CATEGORICAL_MAX_DISTINCT: usize = 20;

/// Sentinel used by the `auto` strategy for string columns without a mode.
pub const UNKNOWN_SENTINEL: &str = "Unknown";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Check if a DataType holds strings.
#[inline]
pub fn is_string_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// Column Classification
// =============================================================================

/// Classify one column given the table's row count.
pub fn classify_series(series: &Series, rows: usize) -> ColumnKind {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_datetime_dtype(dtype) {
        ColumnKind::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        ColumnKind::Categorical
    } else {
        let distinct = series.drop_nulls().n_unique().unwrap_or(0);
        let ratio_limit = rows as f64 * CATEGORICAL_RATIO;
        if (distinct as f64) < ratio_limit || distinct < CATEGORICAL_MAX_DISTINCT {
            ColumnKind::Categorical
        } else {
            ColumnKind::Text
        }
    }
}

/// Classify every column of a table, preserving column order.
pub fn classify_columns(df: &DataFrame) -> ColumnTypeSummary {
    let rows = df.height();
    let mut summary = ColumnTypeSummary::default();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        summary.push(classify_series(series, rows), series.name().to_string());
    }
    summary
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Non-missing values of a numeric Series as f64, in row order. NaN counts
/// as missing.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_options(series)?.into_iter().flatten().collect())
}

/// All values of a numeric Series as f64 with nulls preserved and NaN turned
/// into `None`.
pub fn numeric_options(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Values of a temporal Series as milliseconds since the Unix epoch.
pub fn datetime_millis(series: &Series) -> PolarsResult<Vec<Option<i64>>> {
    let millis = match series.dtype() {
        DataType::Time => {
            let nanos = series.cast(&DataType::Int64)?;
            nanos
                .i64()?
                .into_iter()
                .map(|v| v.map(|ns| ns / 1_000_000))
                .collect()
        }
        _ => {
            let as_datetime =
                series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            let as_int = as_datetime.cast(&DataType::Int64)?;
            as_int.i64()?.into_iter().collect()
        }
    };
    Ok(millis)
}

/// Values rendered as strings with nulls preserved.
pub fn string_options(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Count distinct non-null values, most frequent first.
///
/// Ties keep the order of first appearance, so the result is deterministic.
pub fn value_counts(series: &Series) -> PolarsResult<Vec<ValueCount>> {
    let values = string_options(series)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in values.iter().enumerate() {
        if let Some(v) = value {
            counts.entry(v.as_str()).or_insert((0, idx)).0 += 1;
        }
    }

    let mut ordered: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first))| (value, count, first))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    Ok(ordered
        .into_iter()
        .map(|(value, count, _)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect())
}

/// Row index of the first occurrence of the most frequent non-null value.
pub fn mode_index(series: &Series) -> PolarsResult<Option<usize>> {
    let values = string_options(series)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in values.iter().enumerate() {
        if let Some(v) = value {
            counts.entry(v.as_str()).or_insert((0, idx)).0 += 1;
        }
    }

    Ok(counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, first)| first))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill nulls of a numeric Series with a value.
///
/// Integer columns keep their dtype when the value is integral.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::Float64)?;
    let filled: Float64Chunked = casted
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    let filled = filled.with_name(series.name().clone()).into_series();

    if is_integer_dtype(series.dtype()) && fill_value.fract() == 0.0 {
        filled.cast(series.dtype())
    } else {
        Ok(filled)
    }
}

/// Fill nulls of any Series with the value found at row `index`.
pub fn fill_nulls_from_index(series: &Series, index: usize) -> PolarsResult<Series> {
    let fill = series.get(index)?;
    let values = (0..series.len())
        .map(|i| {
            let value = series.get(i)?;
            Ok(if value.is_null() { fill.clone() } else { value })
        })
        .collect::<PolarsResult<Vec<AnyValue>>>()?;
    Series::from_any_values_and_dtype(series.name().clone(), &values, series.dtype(), true)
}

/// Fill nulls of a Series with a string, casting the column to String.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::String)?;
    let filled: StringChunked = casted
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Replace float NaN with null in every float column.
pub fn nan_to_null(df: DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let replaced = match series.dtype() {
                DataType::Float64 => series
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect::<Float64Chunked>()
                    .with_name(series.name().clone())
                    .into_series(),
                DataType::Float32 => series
                    .f32()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect::<Float32Chunked>()
                    .with_name(series.name().clone())
                    .into_series(),
                _ => series.clone(),
            };
            Ok(replaced.into_column())
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / whole` in percent, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Estimated in-memory size of a table in megabytes.
pub fn frame_memory_mb(df: &DataFrame) -> f64 {
    bytes_to_mb(df.estimated_size() as u64)
}

/// Format an integer with comma thousands separators.
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    #[test]
    fn test_classify_columns() {
        let ids: Vec<String> = (0..30).map(|i| format!("id-{}", i)).collect();
        let cities: Vec<&str> = (0..30).map(|i| if i % 2 == 0 { "Oslo" } else { "Rome" }).collect();
        let flags: Vec<bool> = (0..30).map(|i| i % 3 == 0).collect();
        let amounts: Vec<f64> = (0..30).map(|i| i as f64 * 1.5).collect();

        let df = df![
            "id" => ids,
            "city" => cities,
            "flag" => flags,
            "amount" => amounts,
        ]
        .unwrap();

        let summary = classify_columns(&df);
        assert_eq!(summary.numeric, vec!["amount"]);
        assert_eq!(summary.categorical, vec!["city", "flag"]);
        assert_eq!(summary.text, vec!["id"]);
        assert!(summary.datetime.is_empty());
    }

    #[test]
    fn test_value_counts_tie_break_by_first_appearance() {
        let series = Series::new("s".into(), &[Some("b"), Some("a"), None, Some("a"), Some("b"), Some("c")]);
        let counts = value_counts(&series).unwrap();

        let values: Vec<&str> = counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["b", "a", "c"]);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[2].count, 1);
    }

    #[test]
    fn test_mode_index() {
        let series = Series::new("s".into(), &["x", "y", "y", "x", "z"]);
        assert_eq!(mode_index(&series).unwrap(), Some(0));

        let empty = Series::new("s".into(), &[None::<&str>, None]);
        assert_eq!(mode_index(&empty).unwrap(), None);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_fill_numeric_nulls_keeps_integer_dtype() {
        let series = Series::new("n".into(), &[Some(1i64), None, Some(3)]);
        let filled = fill_numeric_nulls(&series, 2.0).unwrap();
        assert_eq!(filled.dtype(), &DataType::Int64);

        let fractional = fill_numeric_nulls(&series, 2.5).unwrap();
        assert_eq!(fractional.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_fill_nulls_from_index() {
        let series = Series::new("b".into(), &[Some(true), None, Some(false)]);
        let filled = fill_nulls_from_index(&series, 0).unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.bool().unwrap().get(1), Some(true));
        assert_eq!(filled.dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_numeric_extraction_skips_nan() {
        let s = Series::new("x".into(), [Some(1.0), Some(f64::NAN), None, Some(4.0)]);
        assert_eq!(numeric_values(&s).unwrap(), vec![1.0, 4.0]);
        assert_eq!(numeric_options(&s).unwrap(), vec![Some(1.0), None, None, Some(4.0)]);
    }

    #[test]
    fn test_nan_to_null() {
        let df = df!["x" => [Some(1.0), Some(f64::NAN), None]].unwrap();
        let cleaned = nan_to_null(df).unwrap();
        assert_eq!(cleaned.column("x").unwrap().null_count(), 2);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_percentage_guards_zero() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(round_to(2.34567, 2), 2.35);
    }
}
