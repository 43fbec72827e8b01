//! Pipeline module.
//!
//! This module provides the end-to-end analysis pipeline and its progress
//! reporting types.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
