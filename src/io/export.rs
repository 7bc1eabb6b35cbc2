//! Write tables and reports for use outside the pipeline.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::{EvaluationReport, Table};
use crate::error::AppError;

/// Write a table as CSV. Missing cells become empty fields.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writer
        .write_record(table.column_names())
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for i in 0..table.n_rows() {
        let row: Vec<String> = table.row(i).iter().map(|c| c.to_string()).collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row {}: {e}", i + 1)))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))
}

/// Write the evaluation report as pretty JSON.
pub fn write_report_json(path: &Path, report: &EvaluationReport) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::new(2, format!("Failed to serialize report: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| AppError::new(2, format!("Failed to write report '{}': {e}", path.display())))
}
