//! Descriptive statistics, categorical summaries and variance ranking.

use super::DataAnalyzer;
use crate::stats::{kurtosis, mean, quantile_sorted, skewness, sorted, std_dev, variance};
use crate::types::{CategoricalSummary, DescriptiveStats, VarianceEntry};
use crate::utils::{percentage, round_to, value_counts};
use tracing::warn;

const TOP_VALUES: usize = 5;

fn round2(value: Option<f64>) -> Option<f64> {
    value.map(|v| round_to(v, 2))
}

impl DataAnalyzer<'_> {
    /// Summary statistics for every numeric column, rounded to 2 decimals.
    ///
    /// Standard deviation and variance use ddof = 1; skewness and kurtosis
    /// are bias-corrected (kurtosis is excess kurtosis).
    pub fn descriptive_statistics(&self) -> Vec<DescriptiveStats> {
        let rows = self.df.height();
        let mut result = Vec::with_capacity(self.kinds.numeric.len());

        for name in &self.kinds.numeric {
            let values = match self.values(name) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Skipping descriptive statistics for '{}': {}", name, e);
                    continue;
                }
            };
            let s = sorted(&values);
            let missing = rows - values.len();

            result.push(DescriptiveStats {
                column: name.clone(),
                count: values.len(),
                missing,
                missing_percentage: round_to(percentage(missing, rows), 2),
                mean: round2(mean(&values)),
                std: round2(std_dev(&values)),
                min: round2(s.first().copied()),
                q25: round2(quantile_sorted(&s, 0.25)),
                median: round2(quantile_sorted(&s, 0.5)),
                q75: round2(quantile_sorted(&s, 0.75)),
                max: round2(s.last().copied()),
                variance: round2(variance(&values)),
                skewness: round2(skewness(&values)),
                kurtosis: round2(kurtosis(&values)),
            });
        }
        result
    }

    /// Value distribution of every categorical or text column.
    pub fn categorical_analysis(&self) -> Vec<CategoricalSummary> {
        let rows = self.df.height();
        let mut result = Vec::new();

        for name in self.categorical_or_text_columns() {
            let counts = match self.series(name).and_then(|s| Ok(value_counts(s)?)) {
                Ok(counts) => counts,
                Err(e) => {
                    warn!("Skipping categorical analysis for '{}': {}", name, e);
                    continue;
                }
            };

            let top = counts.first();
            result.push(CategoricalSummary {
                column: name.to_string(),
                unique_count: counts.len(),
                most_common: top.map(|c| c.value.clone()),
                most_common_count: top.map(|c| c.count).unwrap_or(0),
                concentration: top.map(|c| percentage(c.count, rows)).unwrap_or(0.0),
                top_values: counts.into_iter().take(TOP_VALUES).collect(),
            });
        }
        result
    }

    /// Numeric columns ranked by sample variance, at most `top_n` of them.
    ///
    /// Columns with fewer than 2 values have no variance and are left out.
    pub fn variance_analysis(&self, top_n: usize) -> Vec<VarianceEntry> {
        let mut entries: Vec<VarianceEntry> = self
            .kinds
            .numeric
            .iter()
            .filter_map(|name| {
                let values = self.values(name).ok()?;
                let var = variance(&values)?;
                let std = var.sqrt();
                let cv = mean(&values)
                    .filter(|m| *m != 0.0)
                    .map(|m| round_to((std / m).abs(), 4));
                Some(VarianceEntry {
                    column: name.clone(),
                    variance: round_to(var, 4),
                    std: round_to(std, 4),
                    coefficient_of_variation: cv,
                })
            })
            .collect();

        entries.sort_by(|a, b| b.variance.total_cmp(&a.variance));
        entries.truncate(top_n);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptive_statistics() {
        let df = df![
            "v" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), None],
        ]
        .unwrap();

        let stats = DataAnalyzer::new(&df).descriptive_statistics();
        assert_eq!(stats.len(), 1);
        let v = &stats[0];
        assert_eq!(v.count, 5);
        assert_eq!(v.missing, 1);
        assert_eq!(v.missing_percentage, 16.67);
        assert_eq!(v.mean, Some(3.0));
        assert_eq!(v.std, Some(1.58));
        assert_eq!(v.min, Some(1.0));
        assert_eq!(v.q25, Some(2.0));
        assert_eq!(v.median, Some(3.0));
        assert_eq!(v.q75, Some(4.0));
        assert_eq!(v.max, Some(5.0));
        assert_eq!(v.variance, Some(2.5));
        assert_eq!(v.skewness, Some(0.0));
        assert_eq!(v.kurtosis, Some(-1.2));
    }

    #[test]
    fn test_descriptive_statistics_small_sample() {
        let df = df!["v" => [Some(7.0), None]].unwrap();

        let stats = DataAnalyzer::new(&df).descriptive_statistics();
        let v = &stats[0];
        assert_eq!(v.mean, Some(7.0));
        assert_eq!(v.std, None);
        assert_eq!(v.variance, None);
        assert_eq!(v.skewness, None);
        assert_eq!(v.kurtosis, None);
    }

    #[test]
    fn test_categorical_analysis() {
        let df = df![
            "color" => [Some("red"), Some("blue"), Some("red"), None, Some("green"), Some("red")],
        ]
        .unwrap();

        let summary = DataAnalyzer::new(&df).categorical_analysis();
        assert_eq!(summary.len(), 1);
        let color = &summary[0];
        assert_eq!(color.unique_count, 3);
        assert_eq!(color.most_common.as_deref(), Some("red"));
        assert_eq!(color.most_common_count, 3);
        assert_eq!(color.concentration, 50.0);
        let top: Vec<&str> = color.top_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(top, vec!["red", "blue", "green"]);
    }

    #[test]
    fn test_categorical_analysis_all_missing() {
        let df = df!["s" => [None::<&str>, None]].unwrap();

        let summary = DataAnalyzer::new(&df).categorical_analysis();
        assert_eq!(summary[0].unique_count, 0);
        assert_eq!(summary[0].most_common, None);
        assert_eq!(summary[0].concentration, 0.0);
    }

    #[test]
    fn test_variance_analysis_ranking() {
        let df = df![
            "narrow" => [1.0, 2.0, 3.0],
            "wide" => [10.0, 20.0, 30.0],
            "centered" => [-1.0, 0.0, 1.0],
        ]
        .unwrap();

        let ranking = DataAnalyzer::new(&df).variance_analysis(2);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].column, "wide");
        assert_eq!(ranking[0].variance, 100.0);
        assert_eq!(ranking[0].coefficient_of_variation, Some(0.5));

        let all = DataAnalyzer::new(&df).variance_analysis(10);
        let centered = all.iter().find(|e| e.column == "centered").unwrap();
        assert_eq!(centered.coefficient_of_variation, None);
    }
}
