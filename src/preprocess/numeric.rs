//! Numerical column pipeline: median imputation, then standard scaling.

use serde::{Deserialize, Serialize};

use crate::domain::Cell;
use crate::error::SchemaError;
use crate::math::{mean, median, population_std};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    /// Population std of the imputed column. Zero means "do not scale".
    pub std: f64,
}

impl NumericColumn {
    pub fn fit(name: &str, cells: &[Cell]) -> Result<Self, SchemaError> {
        let mut observed = Vec::with_capacity(cells.len());
        for (row, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Number(v) => observed.push(*v),
                Cell::Missing => {}
                Cell::Text(_) => {
                    return Err(SchemaError::NonNumeric {
                        column: name.to_string(),
                        row,
                    });
                }
            }
        }

        let median = median(&observed).ok_or_else(|| SchemaError::EmptyColumn {
            column: name.to_string(),
        })?;

        // Scaling statistics are taken after imputation.
        let imputed: Vec<f64> = cells.iter().map(|c| c.as_f64().unwrap_or(median)).collect();
        let mean = mean(&imputed).unwrap_or(median);
        let std = population_std(&imputed).unwrap_or(0.0);

        Ok(Self {
            name: name.to_string(),
            median,
            mean,
            std,
        })
    }

    pub fn apply(&self, cell: &Cell, row: usize) -> Result<f64, SchemaError> {
        let raw = match cell {
            Cell::Number(v) => *v,
            Cell::Missing => self.median,
            Cell::Text(_) => {
                return Err(SchemaError::NonNumeric {
                    column: self.name.clone(),
                    row,
                });
            }
        };
        let scale = if self.std > 0.0 { self.std } else { 1.0 };
        Ok((raw - self.mean) / scale)
    }
}
