//! Pairwise correlation between numeric columns.

use super::DataAnalyzer;
use crate::config::CorrelationMethod;
use crate::stats::{kendall_tau_b, pearson, spearman};
use crate::types::{CorrelationMatrix, CorrelationResult, CorrelationStrength, StrongCorrelation};
use crate::utils::round_to;
use tracing::{debug, warn};

/// Absorbs float noise so |r| = 1.0 meets a threshold of 1.0.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// Rows where both columns are present.
fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

fn coefficient(method: CorrelationMethod, x: &[f64], y: &[f64]) -> Option<f64> {
    match method {
        CorrelationMethod::Pearson => pearson(x, y),
        CorrelationMethod::Spearman => spearman(x, y),
        CorrelationMethod::Kendall => kendall_tau_b(x, y),
    }
}

impl DataAnalyzer<'_> {
    /// Correlation matrix over all numeric columns plus the pairs whose
    /// |r| reaches `threshold`, strongest first.
    ///
    /// Each pair uses only the rows where both columns are present. A pair
    /// with fewer than 2 such rows, or a constant side, has no coefficient.
    pub fn correlation_analysis(&self, method: CorrelationMethod, threshold: f64) -> CorrelationResult {
        let empty = CorrelationResult {
            method,
            matrix: CorrelationMatrix::default(),
            strong_correlations: Vec::new(),
        };

        let mut columns = Vec::new();
        let mut data = Vec::new();
        for name in &self.kinds.numeric {
            match self.options(name) {
                Ok(values) => {
                    columns.push(name.clone());
                    data.push(values);
                }
                Err(e) => warn!("Excluding '{}' from correlation: {}", name, e),
            }
        }
        if columns.len() < 2 {
            return empty;
        }

        let n = columns.len();
        let mut values = vec![vec![None; n]; n];
        let mut strong_correlations = Vec::new();

        for i in 0..n {
            values[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let (x, y) = complete_pairs(&data[i], &data[j]);
                let r = coefficient(method, &x, &y);
                values[i][j] = r;
                values[j][i] = r;

                if let Some(r) = r
                    && r.abs() >= threshold - THRESHOLD_TOLERANCE
                {
                    strong_correlations.push(StrongCorrelation {
                        column_a: columns[i].clone(),
                        column_b: columns[j].clone(),
                        correlation: round_to(r, 3),
                        strength: CorrelationStrength::from_coefficient(r),
                    });
                }
            }
        }

        strong_correlations.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
        debug!(
            "{} correlation over {} columns: {} pairs at |r| >= {}",
            method,
            n,
            strong_correlations.len(),
            threshold
        );

        CorrelationResult {
            method,
            matrix: CorrelationMatrix { columns, values },
            strong_correlations,
        }
    }
}
