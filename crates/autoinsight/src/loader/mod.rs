//! File ingestion.
//!
//! [`DataLoader`] detects the format from the file extension, enforces the
//! package-tier size limit before any parsing, and reads the file into a
//! DataFrame. Float NaN values are normalized to null so downstream stages
//! treat a single notion of "missing".
//!
//! # Example
//!
//! ```rust,ignore
//! use autoinsight::{DataLoader, PackageTier};
//!
//! let (df, metadata) = DataLoader::new(PackageTier::Pro).load("sales.xlsx")?;
//! println!("{} rows x {} columns", metadata.rows, metadata.columns);
//! ```

mod readers;

use crate::config::PackageTier;
use crate::error::{InsightError, Result};
use crate::types::{FileFormat, LoadMetadata};
use crate::utils::{bytes_to_mb, frame_memory_mb, nan_to_null};
use polars::prelude::{DataFrame, JsonFormat};
use std::path::Path;
use tracing::{debug, info};

/// Reads tabular files within the limits of a package tier.
#[derive(Debug, Clone, Copy)]
pub struct DataLoader {
    tier: PackageTier,
}

impl DataLoader {
    pub fn new(tier: PackageTier) -> Self {
        Self { tier }
    }

    pub fn tier(&self) -> PackageTier {
        self.tier
    }

    /// Detect the input format from the file extension (case-insensitive).
    pub fn detect_format(path: &Path) -> Result<FileFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "txt" => Ok(FileFormat::DelimitedText),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            "json" => Ok(FileFormat::Json),
            "jsonl" | "ndjson" => Ok(FileFormat::JsonLines),
            "parquet" => Ok(FileFormat::Parquet),
            "" => Err(InsightError::UnsupportedFormat("<none>".to_string())),
            other => Err(InsightError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Size of the file in megabytes, rejected when above the tier limit.
    pub fn check_size(&self, path: &Path) -> Result<f64> {
        let bytes = std::fs::metadata(path)?.len();
        let size_mb = bytes_to_mb(bytes);
        if bytes > self.tier.limit_bytes() {
            return Err(InsightError::SizeLimitExceeded {
                size_mb,
                limit_mb: self.tier.limit_mb(),
                tier: self.tier,
            });
        }
        Ok(size_mb)
    }

    /// Load a file into a DataFrame.
    ///
    /// # Errors
    ///
    /// `FileNotFound`, `UnsupportedFormat`, `SizeLimitExceeded` or
    /// `ParseError`, checked in that order. The source file is only read.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataFrame, LoadMetadata)> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InsightError::FileNotFound(path.to_path_buf()));
        }

        let format = Self::detect_format(path)?;
        let size_mb = self.check_size(path)?;
        info!(
            "Loading {} ({:.2} MB, format {}, tier {})",
            path.display(),
            size_mb,
            format,
            self.tier
        );

        let parse_error = |reason: String| InsightError::ParseError {
            path: path.to_path_buf(),
            reason,
        };

        let df = match format {
            FileFormat::Csv => readers::read_delimited(path, b',').map_err(|e| parse_error(e.to_string()))?,
            FileFormat::Tsv => readers::read_delimited(path, b'\t').map_err(|e| parse_error(e.to_string()))?,
            FileFormat::DelimitedText => {
                let separator =
                    readers::sniff_delimiter(path).map_err(|e| parse_error(e.to_string()))?;
                debug!("Sniffed delimiter {:?}", separator as char);
                readers::read_delimited(path, separator).map_err(|e| parse_error(e.to_string()))?
            }
            FileFormat::Spreadsheet => readers::read_spreadsheet(path).map_err(parse_error)?,
            FileFormat::Json => {
                readers::read_json(path, JsonFormat::Json).map_err(|e| parse_error(e.to_string()))?
            }
            FileFormat::JsonLines => readers::read_json(path, JsonFormat::JsonLines)
                .map_err(|e| parse_error(e.to_string()))?,
            FileFormat::Parquet => readers::read_parquet(path).map_err(|e| parse_error(e.to_string()))?,
        };

        let df = nan_to_null(df)?;
        let metadata = LoadMetadata {
            rows: df.height(),
            columns: df.width(),
            size_mb,
            memory_usage_mb: frame_memory_mb(&df),
            filename: path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
            format,
        };

        info!(
            "Loaded {} rows x {} columns ({:.2} MB in memory)",
            metadata.rows, metadata.columns, metadata.memory_usage_mb
        );
        Ok((df, metadata))
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(PackageTier::default())
    }
}
