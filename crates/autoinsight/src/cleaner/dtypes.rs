//! Lossless numeric downcasting.

use crate::error::Result;
use crate::types::{DtypeChange, DtypeOptimization};
use crate::utils::{frame_memory_mb, is_integer_dtype, numeric_values, round_to};
use polars::prelude::*;
use tracing::debug;

fn dtype_width(dtype: &DataType) -> usize {
    match dtype {
        DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 => 2,
        DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
        _ => 8,
    }
}

/// Smallest signed integer type holding every value in `[min, max]`.
fn smallest_integer(min: f64, max: f64) -> DataType {
    if min >= i8::MIN as f64 && max <= i8::MAX as f64 {
        DataType::Int8
    } else if min >= i16::MIN as f64 && max <= i16::MAX as f64 {
        DataType::Int16
    } else if min >= i32::MIN as f64 && max <= i32::MAX as f64 {
        DataType::Int32
    } else {
        DataType::Int64
    }
}

fn target_dtype(series: &Series) -> Result<Option<DataType>> {
    let dtype = series.dtype();
    if is_integer_dtype(dtype) {
        let values = numeric_values(series)?;
        if values.is_empty() {
            return Ok(None);
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let target = smallest_integer(min, max);
        Ok((dtype_width(&target) < dtype_width(dtype)).then_some(target))
    } else if matches!(dtype, DataType::Float64) {
        let values = numeric_values(series)?;
        let exact = values.iter().all(|v| (*v as f32) as f64 == *v);
        Ok(exact.then_some(DataType::Float32))
    } else {
        Ok(None)
    }
}

/// Downcast numeric columns in place and report the memory saved.
pub(super) fn optimize(df: &mut DataFrame) -> Result<DtypeOptimization> {
    let memory_before_mb = frame_memory_mb(df);
    let mut changes = Vec::new();

    let names: Vec<String> = df.get_column_names_str().iter().map(|s| s.to_string()).collect();
    for name in names {
        let series = df.column(&name)?.as_materialized_series().clone();
        let Some(target) = target_dtype(&series)? else {
            continue;
        };
        let casted = series.cast(&target)?;
        debug!("Downcast '{}' from {} to {}", name, series.dtype(), target);
        changes.push(DtypeChange {
            column: name.clone(),
            from: series.dtype().to_string(),
            to: target.to_string(),
        });
        df.replace(&name, casted)?;
    }

    let memory_after_mb = frame_memory_mb(df);
    let reduction_percentage = if memory_before_mb > 0.0 {
        round_to((memory_before_mb - memory_after_mb) / memory_before_mb * 100.0, 2)
    } else {
        0.0
    };

    Ok(DtypeOptimization {
        memory_before_mb,
        memory_after_mb,
        reduction_percentage,
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_downcasts_losslessly() {
        let mut df = df![
            "small" => [1i64, 2, 3],
            "wide" => [1i64, 70_000, -5],
            "halves" => [0.5, 1.25, 2.0],
            "precise" => [0.1, 0.2, 0.3],
            "text" => ["a", "b", "c"],
        ]
        .unwrap();

        let result = optimize(&mut df).unwrap();

        assert_eq!(df.column("small").unwrap().dtype(), &DataType::Int8);
        assert_eq!(df.column("wide").unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column("halves").unwrap().dtype(), &DataType::Float32);
        assert_eq!(df.column("precise").unwrap().dtype(), &DataType::Float64);
        assert_eq!(result.changes.len(), 3);
        assert!(result.memory_after_mb <= result.memory_before_mb);
    }

    #[test]
    fn test_optimize_keeps_values() {
        let mut df = df!["n" => [Some(-100i64), None, Some(100)]].unwrap();
        optimize(&mut df).unwrap();

        let n = df.column("n").unwrap();
        assert_eq!(n.dtype(), &DataType::Int8);
        assert_eq!(n.null_count(), 1);
        assert_eq!(n.get(0).unwrap().try_extract::<i64>().unwrap(), -100);
    }
}
