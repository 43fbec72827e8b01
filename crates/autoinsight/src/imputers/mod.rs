//! Imputation module for handling missing values.
//!
//! This module provides the statistical fills (mean, median, mode, constant
//! and forward fill) applied by the cleaner.

mod statistical;

pub use statistical::StatisticalImputer;
