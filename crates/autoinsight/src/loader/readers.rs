//! Format-specific readers. Each returns a raw DataFrame; the caller maps
//! failures to [`InsightError::ParseError`](crate::error::InsightError).

use calamine::{Data, DataType as _, Reader, open_workbook_auto};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Rows used by polars for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Read a delimited text file with a header row.
///
/// Date parsing is attempted first; if that pass fails the file is read
/// again with dates left as strings.
pub(crate) fn read_delimited(path: &Path, separator: u8) -> PolarsResult<DataFrame> {
    let attempt = |parse_dates: bool| {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(separator)
                    .with_quote_char(Some(b'"'))
                    .with_try_parse_dates(parse_dates),
            )
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
    };

    match attempt(true) {
        Ok(df) => Ok(df),
        Err(e) => {
            debug!("Loading with date parsing failed: {}", e);
            attempt(false)
        }
    }
}

/// Pick `,`, `;` or tab from whichever occurs most in the header line.
pub(crate) fn sniff_delimiter(path: &Path) -> std::io::Result<u8> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;

    let comma_count = first_line.matches(',').count();
    let tab_count = first_line.matches('\t').count();
    let semicolon_count = first_line.matches(';').count();

    let delimiter = if tab_count > comma_count && tab_count > semicolon_count {
        b'\t'
    } else if semicolon_count > comma_count {
        b';'
    } else {
        b','
    };
    Ok(delimiter)
}

pub(crate) fn read_json(path: &Path, format: JsonFormat) -> PolarsResult<DataFrame> {
    let file = File::open(path)?;
    JsonReader::new(file).with_json_format(format).finish()
}

pub(crate) fn read_parquet(path: &Path) -> PolarsResult<DataFrame> {
    let file = File::open(path)?;
    ParquetReader::new(file).finish()
}

// ============================================================================
// Spreadsheets
// ============================================================================

/// Column type decided from the non-empty cells of a worksheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    Boolean,
    DateTime,
    Text,
}

fn cell_kind(cell: &Data) -> Option<CellKind> {
    match cell {
        Data::Empty => None,
        Data::Int(_) | Data::Float(_) => Some(CellKind::Number),
        Data::Bool(_) => Some(CellKind::Boolean),
        Data::DateTime(_) | Data::DateTimeIso(_) if cell.as_datetime().is_some() => {
            Some(CellKind::DateTime)
        }
        _ => Some(CellKind::Text),
    }
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(
            cell.as_datetime()
                .map(|dt| dt.to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(format!("#ERR:{:?}", e)),
    }
}

/// Header names made non-empty and unique.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let base = cell_to_string(cell)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("column_{}", idx + 1));
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn build_column(name: &str, cells: &[&Data]) -> PolarsResult<Column> {
    let kinds: Vec<CellKind> = cells.iter().filter_map(|c| cell_kind(c)).collect();
    let uniform = kinds.first().filter(|first| kinds.iter().all(|k| k == *first));

    let series = match uniform {
        None if kinds.is_empty() => {
            Series::new(name.into(), vec![None::<f64>; cells.len()])
        }
        Some(CellKind::Number) => {
            let values: Vec<Option<f64>> = cells.iter().map(|c| c.as_f64()).collect();
            Series::new(name.into(), values)
        }
        Some(CellKind::Boolean) => {
            let values: Vec<Option<bool>> = cells.iter().map(|c| c.get_bool()).collect();
            Series::new(name.into(), values)
        }
        Some(CellKind::DateTime) => {
            let millis: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.as_datetime().map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            Series::new(name.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        _ => {
            let values: Vec<Option<String>> = cells.iter().map(|c| cell_to_string(c)).collect();
            Series::new(name.into(), values)
        }
    };
    Ok(series.into_column())
}

/// Read the first worksheet; the first row is the header.
pub(crate) fn read_spreadsheet(path: &Path) -> Result<DataFrame, String> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Failed to open workbook: {}", e))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| "Workbook has no worksheets".to_string())?;

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| format!("Failed to read worksheet '{}': {}", sheet_name, e))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| format!("Worksheet '{}' is empty", sheet_name))?;
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();

    let empty = Data::Empty;
    let columns = names
        .iter()
        .enumerate()
        .map(|(ci, name)| {
            let cells: Vec<&Data> = body.iter().map(|row| row.get(ci).unwrap_or(&empty)).collect();
            build_column(name, &cells)
        })
        .collect::<PolarsResult<Vec<Column>>>()
        .map_err(|e| e.to_string())?;

    DataFrame::new(columns).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sniff_delimiter() {
        let dir = tempfile::tempdir().unwrap();

        let semicolon = dir.path().join("a.txt");
        std::fs::write(&semicolon, "a;b;c\n1;2;3\n").unwrap();
        assert_eq!(sniff_delimiter(&semicolon).unwrap(), b';');

        let tab = dir.path().join("b.txt");
        std::fs::write(&tab, "a\tb\tc\n1\t2\t3\n").unwrap();
        assert_eq!(sniff_delimiter(&tab).unwrap(), b'\t');

        let comma = dir.path().join("c.txt");
        let mut file = File::create(&comma).unwrap();
        writeln!(file, "a,b").unwrap();
        assert_eq!(sniff_delimiter(&comma).unwrap(), b',');
    }

    #[test]
    fn test_header_names_are_unique() {
        let header = vec![
            Data::String("a".to_string()),
            Data::Empty,
            Data::String("a".to_string()),
        ];
        assert_eq!(header_names(&header), vec!["a", "column_2", "a_1"]);
    }

    #[test]
    fn test_build_column_types() {
        let numbers = [Data::Int(1), Data::Float(2.5), Data::Empty];
        let refs: Vec<&Data> = numbers.iter().collect();
        let column = build_column("n", &refs).unwrap();
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 1);

        let mixed = [Data::Int(1), Data::String("x".to_string())];
        let refs: Vec<&Data> = mixed.iter().collect();
        assert_eq!(build_column("m", &refs).unwrap().dtype(), &DataType::String);

        let flags = [Data::Bool(true), Data::Empty, Data::Bool(false)];
        let refs: Vec<&Data> = flags.iter().collect();
        assert_eq!(build_column("b", &refs).unwrap().dtype(), &DataType::Boolean);
    }
}
