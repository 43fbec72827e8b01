//! Custom error types for the analysis pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Input errors
//! (loader), configuration errors and per-column computation failures are
//! separate variants so callers can tell a fatal pipeline stop apart from a
//! benign, recoverable condition.
//!
//! Errors are serializable so they can be forwarded to a front-end as
//! `{ "code": ..., "message": ... }`.

use crate::config::{ConfigValidationError, PackageTier};
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File extension is not one of the supported tabular formats.
    #[error("Unsupported file format: '{0}' (expected csv, tsv, txt, xlsx, xls, ods, json, jsonl or parquet)")]
    UnsupportedFormat(String),

    /// File is larger than the limit of the selected package tier.
    #[error("File size {size_mb:.2} MB exceeds the {limit_mb} MB limit of the '{tier}' package")]
    SizeLimitExceeded {
        size_mb: f64,
        limit_mb: f64,
        tier: PackageTier,
    },

    /// File content could not be parsed into a table.
    #[error("Failed to parse '{}': {reason}", path.display())]
    ParseError { path: PathBuf, reason: String },

    /// Invalid configuration value (unknown strategy/method name, bad threshold).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration failed builder validation.
    #[error(transparent)]
    ConfigValidation(#[from] ConfigValidationError),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Report or chart data could not be written.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::SizeLimitExceeded { .. } => "SIZE_LIMIT_EXCEEDED",
            Self::ParseError { .. } => "PARSE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ConfigValidation(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the input file (user-actionable).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::FileNotFound(_)
            | Self::UnsupportedFormat(_)
            | Self::SizeLimitExceeded { .. }
            | Self::ParseError { .. } => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }

    /// Check if this error was caused by an invalid configuration.
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::ConfigValidation(_) => true,
            Self::WithContext { source, .. } => source.is_config_error(),
            _ => false,
        }
    }
}

impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}
