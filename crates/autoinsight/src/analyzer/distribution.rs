//! Shapiro-Wilk normality tests.

use super::DataAnalyzer;
use crate::stats::sample_without_replacement;
use crate::types::{NormalityOutcome, NormalityResult};
use crate::utils::round_to;
use tracing::debug;

/// Largest sample the test is run on.
const MAX_SAMPLE: usize = 5000;
const SAMPLE_SEED: u64 = 42;
const ALPHA: f64 = 0.05;

impl DataAnalyzer<'_> {
    /// Normality test for every numeric column.
    ///
    /// Columns longer than 5000 values are tested on a seeded random sample
    /// of 5000. Fewer than 3 values or a constant column is untestable.
    pub fn distribution_tests(&self) -> Vec<NormalityResult> {
        self.kinds
            .numeric
            .iter()
            .map(|name| NormalityResult {
                column: name.clone(),
                outcome: self.normality_of(name),
            })
            .collect()
    }

    fn normality_of(&self, name: &str) -> NormalityOutcome {
        let values = match self.values(name) {
            Ok(values) => values,
            Err(e) => {
                return NormalityOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if values.len() < 3 {
            return NormalityOutcome::Untestable {
                reason: format!("needs at least 3 values, found {}", values.len()),
            };
        }

        let sample = if values.len() > MAX_SAMPLE {
            debug!("Sampling '{}' from {} to {} values", name, values.len(), MAX_SAMPLE);
            sample_without_replacement(&values, MAX_SAMPLE, SAMPLE_SEED)
        } else {
            values
        };

        let (min, max) = sample
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if max - min <= 0.0 {
            return NormalityOutcome::Untestable {
                reason: "all values are equal".to_string(),
            };
        }

        match u_analytics::testing::shapiro_wilk_test(&sample) {
            Some(result) => NormalityOutcome::Tested {
                statistic: round_to(result.w, 4),
                p_value: round_to(result.p_value, 4),
                is_normal: result.p_value > ALPHA,
                sample_size: sample.len(),
            },
            None => NormalityOutcome::Failed {
                reason: format!("Shapiro-Wilk is undefined for {} values", sample.len()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_symmetric_sample_is_normal() {
        let df = df!["v" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();
        let results = DataAnalyzer::new(&df).distribution_tests();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].is_normal(), Some(true));
        match &results[0].outcome {
            NormalityOutcome::Tested {
                statistic,
                sample_size,
                ..
            } => {
                assert!((statistic - 0.9868).abs() < 1e-3);
                assert_eq!(*sample_size, 5);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_skewed_sample_is_not_normal() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 / 6.0).exp()).collect();
        let df = df!["v" => values].unwrap();
        let results = DataAnalyzer::new(&df).distribution_tests();
        assert_eq!(results[0].is_normal(), Some(false));
    }

    #[test]
    fn test_degenerate_columns_are_untestable() {
        let df = df![
            "short" => [Some(1.0), Some(2.0), None],
            "constant" => [Some(3.0), Some(3.0), Some(3.0)],
        ]
        .unwrap();
        let results = DataAnalyzer::new(&df).distribution_tests();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(matches!(result.outcome, NormalityOutcome::Untestable { .. }));
            assert_eq!(result.is_normal(), None);
        }
    }

    #[test]
    fn test_large_column_is_sampled() {
        let values: Vec<f64> = (0..6000).map(|i| ((i * 7919) % 6000) as f64).collect();
        let df = df!["v" => values].unwrap();
        let results = DataAnalyzer::new(&df).distribution_tests();

        match &results[0].outcome {
            NormalityOutcome::Tested { sample_size, .. } => assert_eq!(*sample_size, 5000),
            other => panic!("unexpected outcome {:?}", other),
        }
        // seeded sampling is reproducible
        assert_eq!(results, DataAnalyzer::new(&df).distribution_tests());
    }
}
