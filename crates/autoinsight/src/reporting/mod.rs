//! Report generation module.
//!
//! This module provides functionality for generating analysis reports
//! and exporting chart data.
//!
//! # Comprehensive Reports
//!
//! Use [`ComprehensiveReport`] to generate unified reports suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use autoinsight::reporting::{ChartGenerator, ReportGenerator};
//!
//! let charts = ChartGenerator::new(&df, "outputs").generate_all(CorrelationMethod::Pearson);
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.write_report_to_file(&report, "sales")?;
//! ```

mod charts;
mod generator;

pub use charts::{
    BoxSummary, CategoryBar, CategoryCounts, ChartGenerator, Heatmap, Histogram, HistogramBin,
    ScatterMatrix, TimeSeries, TimeSeriesLine,
};
pub use generator::{ComprehensiveReport, ProcessingSummary, ReportGenerator, ReportParams};
