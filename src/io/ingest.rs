//! CSV ingest.
//!
//! This module is responsible for turning a transaction CSV into a typed
//! [`Table`] that is safe to split and fit.
//!
//! Design goals:
//! - **Strict header checks** (missing target or duplicate columns fail the run)
//! - **Row-level validation** (skip rows without a usable target, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no feature logic here; extra columns are kept
//!   and left for the schema audit to drop

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Cell, Table};
use crate::error::{PipelineError, SchemaError};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the typed table, the untouched source bytes and row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub table: Table,
    /// Exact bytes of the source file, kept for the raw snapshot artifact.
    pub raw: Vec<u8>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Read a transaction CSV from disk.
pub fn load_table(path: &Path, target: &str) -> Result<IngestedData, PipelineError> {
    let raw = std::fs::read(path)
        .map_err(|e| PipelineError::Ingest(format!("failed to read CSV '{}': {e}", path.display())))?;
    parse_table(raw, target)
}

/// Parse CSV bytes. Rows whose `target` is missing or non-numeric are skipped.
pub fn parse_table(raw: Vec<u8>, target: &str) -> Result<IngestedData, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Ingest(format!("failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers)?;
    let target_idx = *header_map.get(target).ok_or_else(|| SchemaError::MissingColumn {
        column: target.to_string(),
    })?;

    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let mut table = Table::new(names);
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let cells: Vec<Cell> = record.iter().map(Cell::parse).collect();
        match cells.get(target_idx) {
            Some(Cell::Number(_)) => table.push_row(cells),
            Some(Cell::Text(v)) => row_errors.push(RowError {
                line,
                message: format!("non-numeric `{target}` value '{v}'"),
            }),
            Some(Cell::Missing) | None => row_errors.push(RowError {
                line,
                message: format!("missing `{target}` value"),
            }),
        }
    }

    for err in row_errors.iter().take(5) {
        tracing::warn!(line = err.line, "skipped row: {}", err.message);
    }
    if row_errors.len() > 5 {
        tracing::warn!("{} more rows skipped", row_errors.len() - 5);
    }

    let rows_used = table.n_rows();
    if rows_used == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "no rows with a numeric `{target}` value ({rows_read} rows read)"
        )));
    }

    Ok(IngestedData {
        table,
        raw,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> Result<HashMap<String, usize>, PipelineError> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        let name = normalize_header_name(name);
        if map.insert(name.clone(), idx).is_some() {
            return Err(PipelineError::Ingest(format!("duplicate CSV column `{name}`")));
        }
    }
    Ok(map)
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the first column never matches the
    // schema.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<IngestedData, PipelineError> {
        parse_table(text.as_bytes().to_vec(), "Price_Lakhs")
    }

    #[test]
    fn types_cells_and_keeps_extra_columns() {
        let data = parse("\u{feff}Location_Name,Area_SqFt,Extra,Price_Lakhs\nKondapur,1200,x,85.5\nUppal,,y,40\n").unwrap();
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.table.column_names().next(), Some("Location_Name"));
        assert_eq!(data.table.column("Area_SqFt").unwrap(), &[Cell::Number(1200.0), Cell::Missing]);
        assert!(data.table.has_column("Extra"));
    }

    #[test]
    fn rows_without_target_are_skipped_and_reported() {
        let data = parse("Area_SqFt,Price_Lakhs\n1000,50\n900,\n800,cheap\n700,30\n").unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn missing_target_column_is_a_schema_error() {
        let err = parse("Area_SqFt\n1000\n").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(SchemaError::MissingColumn { ref column }) if column == "Price_Lakhs"));
    }

    #[test]
    fn no_usable_rows_is_insufficient_data() {
        let err = parse("Area_SqFt,Price_Lakhs\n1000,\n").unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        assert!(matches!(parse("A,A,Price_Lakhs\n1,2,3\n"), Err(PipelineError::Ingest(_))));
    }

    #[test]
    fn raw_bytes_are_preserved() {
        let text = "Area_SqFt,Price_Lakhs\n1000,50\n";
        assert_eq!(parse(text).unwrap().raw, text.as_bytes());
    }
}
