//! Daily trend detection for numeric columns over datetime columns.

use super::DataAnalyzer;
use crate::error::{Result, ResultExt};
use crate::stats::{linear_slope, std_dev};
use crate::types::{DateRange, TimePattern, TrendDirection};
use crate::utils::datetime_millis;
use chrono::DateTime;
use std::collections::BTreeMap;
use tracing::warn;

/// Numeric columns examined per datetime column.
const MAX_VALUE_COLUMNS: usize = 3;
const MILLIS_PER_DAY: i64 = 86_400_000;
/// A slope below this fraction of the daily series' std is flat.
const FLAT_FRACTION: f64 = 0.01;

/// Mean value per calendar day (UTC), for days with at least one pair.
fn daily_means(times: &[Option<i64>], values: &[Option<f64>]) -> BTreeMap<i64, f64> {
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (t, v) in times.iter().zip(values) {
        if let (Some(t), Some(v)) = (t, v) {
            let bucket = buckets.entry(t.div_euclid(MILLIS_PER_DAY)).or_insert((0.0, 0));
            bucket.0 += v;
            bucket.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect()
}

fn format_day(day: i64) -> String {
    DateTime::from_timestamp(day * 86_400, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| day.to_string())
}

/// Trend direction of an evenly spaced series.
pub(crate) fn classify_trend(series: &[f64]) -> (TrendDirection, Option<f64>) {
    let Some(slope) = linear_slope(series) else {
        return (TrendDirection::InsufficientData, None);
    };
    let spread = std_dev(series).unwrap_or(0.0);
    let direction = if slope == 0.0 || slope.abs() < spread * FLAT_FRACTION {
        TrendDirection::Flat
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };
    (direction, Some(slope))
}

impl DataAnalyzer<'_> {
    /// Trend of each of the first 3 numeric columns against every datetime
    /// column, after resampling to daily means.
    pub fn detect_time_patterns(&self) -> Vec<TimePattern> {
        let mut patterns = Vec::new();
        for dt_col in &self.kinds.datetime {
            let times = match self.times(dt_col) {
                Ok(times) => times,
                Err(e) => {
                    warn!("Skipping time patterns for '{}': {}", dt_col, e);
                    continue;
                }
            };

            for value_col in self.kinds.numeric.iter().take(MAX_VALUE_COLUMNS) {
                let values = match self.options(value_col) {
                    Ok(values) => values,
                    Err(e) => {
                        warn!("Skipping time pattern '{}' x '{}': {}", dt_col, value_col, e);
                        continue;
                    }
                };

                let daily = daily_means(&times, &values);
                let series: Vec<f64> = daily.values().copied().collect();
                let (trend, slope) = classify_trend(&series);
                let date_range = match (daily.keys().next(), daily.keys().next_back()) {
                    (Some(first), Some(last)) => Some(DateRange {
                        start: format_day(*first),
                        end: format_day(*last),
                    }),
                    _ => None,
                };

                patterns.push(TimePattern {
                    datetime_column: dt_col.clone(),
                    value_column: value_col.clone(),
                    trend,
                    slope,
                    date_range,
                    periods: series.len(),
                });
            }
        }
        patterns
    }

    fn times(&self, name: &str) -> Result<Vec<Option<i64>>> {
        datetime_millis(self.series(name)?).context(format!("reading column '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn dated_frame(values: Vec<f64>) -> DataFrame {
        let days: Vec<i64> = (0..values.len() as i64).map(|d| d * MILLIS_PER_DAY).collect();
        let ts = Series::new("ts".into(), days)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let v = Series::new("v".into(), values);
        DataFrame::new(vec![ts.into(), v.into()]).unwrap()
    }

    #[test]
    fn test_increasing_trend() {
        let df = dated_frame((0..10).map(|i| i as f64 * 2.0).collect());
        let patterns = DataAnalyzer::new(&df).detect_time_patterns();

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.trend, TrendDirection::Increasing);
        assert_eq!(p.periods, 10);
        assert!((p.slope.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(
            p.date_range,
            Some(DateRange {
                start: "1970-01-01".to_string(),
                end: "1970-01-10".to_string(),
            })
        );
    }

    #[test]
    fn test_decreasing_and_flat_trends() {
        assert_eq!(classify_trend(&[5.0, 4.0, 3.0]).0, TrendDirection::Decreasing);
        assert_eq!(classify_trend(&[7.0, 7.0, 7.0]).0, TrendDirection::Flat);
        // tiny drift relative to the spread
        assert_eq!(classify_trend(&[0.0, 100.0, 0.001, 100.0, 0.0]).0, TrendDirection::Flat);
    }

    #[test]
    fn test_single_day_is_insufficient() {
        let mut df = dated_frame(vec![1.0, 2.0]);
        let same_day = Series::new("ts".into(), [0i64, 3_600_000])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        df.replace("ts", same_day).unwrap();

        let patterns = DataAnalyzer::new(&df).detect_time_patterns();
        assert_eq!(patterns[0].trend, TrendDirection::InsufficientData);
        assert_eq!(patterns[0].slope, None);
        assert_eq!(patterns[0].periods, 1);
    }

    #[test]
    fn test_daily_means_average_within_a_day() {
        let times = [Some(0), Some(1_000), Some(MILLIS_PER_DAY), None];
        let values = [Some(1.0), Some(3.0), Some(10.0), Some(99.0)];
        let daily = daily_means(&times, &values);
        assert_eq!(daily.into_iter().collect::<Vec<_>>(), vec![(0, 2.0), (1, 10.0)]);
    }

    #[test]
    fn test_no_datetime_columns() {
        let df = df!["v" => [1.0, 2.0]].unwrap();
        assert!(DataAnalyzer::new(&df).detect_time_patterns().is_empty());
    }
}
