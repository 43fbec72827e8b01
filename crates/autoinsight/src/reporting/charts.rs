//! Chart data export.
//!
//! Each chart is written as `<output_dir>/<kind>.json` holding the numbers a
//! front-end needs to draw it. A chart whose inputs are missing (no numeric
//! columns, a single numeric column for the scatter matrix, ...) is reported
//! as not produced with a reason instead of failing the run.

use crate::analyzer::DataAnalyzer;
use crate::cleaner::iqr_outliers;
use crate::config::CorrelationMethod;
use crate::error::{InsightError, Result};
use crate::stats::{mean, quantile_sorted, sorted};
use crate::types::{ChartArtifact, ChartKind, ChartStatus, CorrelationMatrix};
use crate::utils::{datetime_millis, numeric_options, numeric_values, percentage, value_counts};
use chrono::DateTime;
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const HISTOGRAM_BINS: usize = 30;
const MAX_DISTRIBUTION_COLUMNS: usize = 9;
const MAX_CATEGORICAL_COLUMNS: usize = 6;
const CATEGORICAL_TOP_N: usize = 10;
const MAX_BOXPLOT_COLUMNS: usize = 9;
const MAX_SCATTER_COLUMNS: usize = 5;
const MAX_TIME_SERIES_COLUMNS: usize = 3;

// ============================================================================
// Chart payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBar {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCounts {
    pub column: String,
    pub bars: Vec<CategoryBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub method: CorrelationMethod,
    pub matrix: CorrelationMatrix,
}

/// Five-number summary plus IQR fences of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub column: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub outliers: usize,
}

/// Column-major values for a pairwise scatter grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesLine {
    pub column: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub datetime_column: String,
    /// ISO-8601 timestamps, ascending.
    pub timestamps: Vec<String>,
    pub lines: Vec<TimeSeriesLine>,
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
///
/// A constant sample gets a unit-wide range centered on its value.
pub(crate) fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

fn box_summary(column: &str, values: &[f64]) -> Option<BoxSummary> {
    let s = sorted(values);
    let flagged = iqr_outliers(values);
    Some(BoxSummary {
        column: column.to_string(),
        min: *s.first()?,
        q1: quantile_sorted(&s, 0.25)?,
        median: quantile_sorted(&s, 0.5)?,
        q3: quantile_sorted(&s, 0.75)?,
        max: *s.last()?,
        lower_fence: flagged.lower?,
        upper_fence: flagged.upper?,
        outliers: flagged.count,
    })
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

// ============================================================================
// Generator
// ============================================================================

/// Writes chart data for one table.
pub struct ChartGenerator<'a> {
    df: &'a DataFrame,
    analyzer: DataAnalyzer<'a>,
    output_dir: PathBuf,
}

impl<'a> ChartGenerator<'a> {
    pub fn new(df: &'a DataFrame, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            df,
            analyzer: DataAnalyzer::new(df),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Produce every chart kind, in [`ChartKind::ALL`] order.
    pub fn generate_all(&self, method: CorrelationMethod) -> Vec<ChartArtifact> {
        let artifacts = vec![
            self.distributions(),
            self.categorical(),
            self.correlation_heatmap(method),
            self.boxplots(),
            self.scatter_matrix(),
            self.time_series(),
        ];
        let produced = artifacts.iter().filter(|a| a.is_produced()).count();
        info!(
            "Chart data: {} of {} written to {}",
            produced,
            artifacts.len(),
            self.output_dir.display()
        );
        artifacts
    }

    /// 30-bin histograms of the first 9 numeric columns.
    pub fn distributions(&self) -> ChartArtifact {
        let mut histograms = Vec::new();
        for name in self.numeric().iter().take(MAX_DISTRIBUTION_COLUMNS) {
            let Some(values) = self.values(name) else { continue };
            let s = sorted(&values);
            let (Some(m), Some(median)) = (mean(&values), quantile_sorted(&s, 0.5)) else {
                continue;
            };
            histograms.push(Histogram {
                column: name.clone(),
                mean: m,
                median,
                bins: histogram(&values, HISTOGRAM_BINS),
            });
        }
        if histograms.is_empty() {
            return not_produced(ChartKind::Distributions, "no numeric columns with values");
        }
        self.write(ChartKind::Distributions, &histograms)
    }

    /// Top-10 value counts of the first 6 categorical or text columns.
    pub fn categorical(&self) -> ChartArtifact {
        let rows = self.df.height();
        let mut charts = Vec::new();
        for name in self
            .analyzer
            .categorical_or_text_columns()
            .into_iter()
            .take(MAX_CATEGORICAL_COLUMNS)
        {
            let Some(counts) = self.series(name).and_then(|s| value_counts(s).ok()) else {
                continue;
            };
            let bars = counts
                .into_iter()
                .take(CATEGORICAL_TOP_N)
                .map(|c| CategoryBar {
                    percentage: percentage(c.count, rows),
                    value: c.value,
                    count: c.count,
                })
                .collect();
            charts.push(CategoryCounts {
                column: name.to_string(),
                bars,
            });
        }
        if charts.is_empty() {
            return not_produced(ChartKind::Categorical, "no categorical columns");
        }
        self.write(ChartKind::Categorical, &charts)
    }

    pub fn correlation_heatmap(&self, method: CorrelationMethod) -> ChartArtifact {
        if self.numeric().len() < 2 {
            return not_produced(ChartKind::CorrelationHeatmap, "needs at least 2 numeric columns");
        }
        let result = self.analyzer.correlation_analysis(method, 1.0);
        self.write(
            ChartKind::CorrelationHeatmap,
            &Heatmap {
                method,
                matrix: result.matrix,
            },
        )
    }

    /// Five-number summaries of the first 9 numeric columns.
    pub fn boxplots(&self) -> ChartArtifact {
        let boxes: Vec<BoxSummary> = self
            .numeric()
            .iter()
            .take(MAX_BOXPLOT_COLUMNS)
            .filter_map(|name| box_summary(name, &self.values(name)?))
            .collect();
        if boxes.is_empty() {
            return not_produced(ChartKind::Boxplots, "no numeric columns with values");
        }
        self.write(ChartKind::Boxplots, &boxes)
    }

    /// Raw values of the first 5 numeric columns.
    pub fn scatter_matrix(&self) -> ChartArtifact {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for name in self.numeric().iter().take(MAX_SCATTER_COLUMNS) {
            if let Some(options) = self.options(name) {
                columns.push(name.clone());
                values.push(options);
            }
        }
        if columns.len() < 2 {
            return not_produced(ChartKind::ScatterMatrix, "needs at least 2 numeric columns");
        }
        self.write(ChartKind::ScatterMatrix, &ScatterMatrix { columns, values })
    }

    /// First 3 numeric columns against the first datetime column, in time
    /// order. Rows without a timestamp are left out.
    pub fn time_series(&self) -> ChartArtifact {
        let Some(dt_col) = self.analyzer.column_types().datetime.first() else {
            return not_produced(ChartKind::TimeSeries, "no datetime columns");
        };
        let value_cols: Vec<&String> =
            self.numeric().iter().take(MAX_TIME_SERIES_COLUMNS).collect();
        if value_cols.is_empty() {
            return not_produced(ChartKind::TimeSeries, "no numeric columns");
        }

        let times = match self.series(dt_col).map(datetime_millis) {
            Some(Ok(times)) => times,
            Some(Err(e)) => return not_produced(ChartKind::TimeSeries, e),
            None => return not_produced(ChartKind::TimeSeries, "datetime column missing"),
        };

        let mut order: Vec<(usize, i64)> = times
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, t)))
            .collect();
        order.sort_by_key(|&(i, t)| (t, i));

        let lines = value_cols
            .into_iter()
            .filter_map(|name| {
                let options = self.options(name)?;
                Some(TimeSeriesLine {
                    column: name.clone(),
                    values: order.iter().map(|&(i, _)| options[i]).collect(),
                })
            })
            .collect();

        self.write(
            ChartKind::TimeSeries,
            &TimeSeries {
                datetime_column: dt_col.clone(),
                timestamps: order.iter().map(|&(_, t)| format_timestamp(t)).collect(),
                lines,
            },
        )
    }

    fn numeric(&self) -> &[String] {
        self.analyzer.numeric_columns()
    }

    fn series(&self, name: &str) -> Option<&Series> {
        self.df.column(name).ok().map(|c| c.as_materialized_series())
    }

    fn values(&self, name: &str) -> Option<Vec<f64>> {
        let values = numeric_values(self.series(name)?).ok()?;
        (!values.is_empty()).then_some(values)
    }

    fn options(&self, name: &str) -> Option<Vec<Option<f64>>> {
        numeric_options(self.series(name)?).ok()
    }

    fn write<T: Serialize>(&self, kind: ChartKind, payload: &T) -> ChartArtifact {
        match self.try_write(kind, payload) {
            Ok(path) => {
                debug!("Chart data written: {}", path.display());
                ChartArtifact {
                    kind,
                    status: ChartStatus::Produced { path },
                }
            }
            Err(e) => {
                warn!("Could not write {} chart data: {}", kind.file_stem(), e);
                not_produced(kind, e)
            }
        }
    }

    fn try_write<T: Serialize>(&self, kind: ChartKind, payload: &T) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{}.json", kind.file_stem()));
        let failed = |e: std::io::Error| {
            InsightError::ReportGenerationFailed(format!("{}: {}", path.display(), e))
        };
        fs::create_dir_all(&self.output_dir).map_err(failed)?;
        fs::write(&path, serde_json::to_string_pretty(payload)?).map_err(failed)?;
        Ok(path)
    }
}

fn not_produced(kind: ChartKind, reason: impl ToString) -> ChartArtifact {
    ChartArtifact {
        kind,
        status: ChartStatus::NotProduced {
            reason: reason.to_string(),
        },
    }
}
