//! Feature engineering shared by training and inference.
//!
//! Both paths call [`engineer`] with the same [`AgeRule`]: training takes it
//! from the run's `Schema`, inference takes it from the fitted preprocessor
//! artifact, which recorded the schema's rule at fit time.

use crate::domain::{AgeRule, Cell, Table};
use crate::error::SchemaError;

/// Return a copy of `table` with the engineered age column added.
///
/// Missing construction years propagate as missing ages (the preprocessor
/// imputes them later).
pub fn engineer(table: &Table, rule: &AgeRule) -> Result<Table, SchemaError> {
    let source = table.column(&rule.source).ok_or_else(|| SchemaError::MissingColumn {
        column: rule.source.clone(),
    })?;

    let reference = f64::from(rule.reference_year);
    let ages = source
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Missing => Ok(Cell::Missing),
            Cell::Number(year) => Ok(Cell::Number(reference - year)),
            Cell::Text(_) => Err(SchemaError::NonNumeric {
                column: rule.source.clone(),
                row,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = table.clone();
    out.set_column(&rule.output, ages);
    Ok(out)
}
