//! Rule-based plain-language insights.

use super::DataAnalyzer;
use crate::config::CorrelationMethod;
use crate::types::{Insight, InsightKind};
use crate::utils::{format_thousands, percentage, value_counts};

/// Overall missing share above which an insight is raised, in percent.
const MISSING_ALERT_PCT: f64 = 5.0;
/// Distinct share of rows above which a column looks like an identifier.
const IDENTIFIER_RATIO: f64 = 0.8;
const STRONG_CORRELATION: f64 = 0.7;

impl DataAnalyzer<'_> {
    /// Insights in a fixed rule order: shape, missing data, identifier-like
    /// columns, strong correlations, highest variability.
    pub fn generate_insights(&self) -> Vec<Insight> {
        let rows = self.df.height();
        let cols = self.df.width();
        let mut insights = vec![Insight {
            kind: InsightKind::Shape,
            message: format!(
                "The dataset has {} rows and {} columns.",
                format_thousands(rows),
                cols
            ),
        }];

        let missing: usize = self.df.get_columns().iter().map(|c| c.null_count()).sum();
        let missing_pct = percentage(missing, rows * cols);
        if missing_pct > MISSING_ALERT_PCT {
            insights.push(Insight {
                kind: InsightKind::MissingData,
                message: format!("{:.1}% of all values are missing.", missing_pct),
            });
        }

        let identifiers: Vec<&str> = self
            .categorical_or_text_columns()
            .into_iter()
            .filter(|name| {
                self.series(name)
                    .ok()
                    .and_then(|s| value_counts(s).ok())
                    .is_some_and(|counts| counts.len() as f64 > rows as f64 * IDENTIFIER_RATIO)
            })
            .collect();
        if !identifiers.is_empty() {
            insights.push(Insight {
                kind: InsightKind::Identifier,
                message: format!(
                    "Columns {} contain mostly unique values and may be identifiers.",
                    identifiers.join(", ")
                ),
            });
        }

        if self.kinds.numeric.len() >= 2 {
            let strong = self
                .correlation_analysis(CorrelationMethod::Pearson, STRONG_CORRELATION)
                .strong_correlations;
            if !strong.is_empty() {
                insights.push(Insight {
                    kind: InsightKind::Correlation,
                    message: format!(
                        "{} strong correlations (|r| >= {}) were detected.",
                        strong.len(),
                        STRONG_CORRELATION
                    ),
                });
            }
        }

        if let Some(top) = self.variance_analysis(3).first() {
            insights.push(Insight {
                kind: InsightKind::Variance,
                message: format!("Column '{}' shows the highest variability.", top.column),
            });
        }

        insights
    }
}
