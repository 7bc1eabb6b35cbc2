//! Categorical column pipeline: most-frequent imputation, then one-hot
//! expansion against the vocabulary learned at fit time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::Cell;
use crate::error::SchemaError;
use crate::math::mode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub mode: String,
    /// Sorted, distinct labels seen during fit. One output slot per label.
    pub vocabulary: Vec<String>,
}

impl CategoricalColumn {
    pub fn fit(name: &str, cells: &[Cell]) -> Result<Self, SchemaError> {
        let labels: Vec<String> = cells.iter().filter_map(Cell::category).collect();
        let mode = mode(labels.iter().map(String::as_str)).ok_or_else(|| SchemaError::EmptyColumn {
            column: name.to_string(),
        })?;

        let vocabulary: BTreeSet<String> = labels.into_iter().collect();

        Ok(Self {
            name: name.to_string(),
            mode,
            vocabulary: vocabulary.into_iter().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Write the indicator vector for `cell` into `out` (length `width()`).
    ///
    /// Labels outside the vocabulary leave `out` all zero.
    pub fn encode(&self, cell: &Cell, out: &mut [f64]) {
        out.fill(0.0);
        let label = cell.category().unwrap_or_else(|| self.mode.clone());
        if let Ok(idx) = self.vocabulary.binary_search(&label) {
            out[idx] = 1.0;
        }
    }

    pub fn output_names(&self) -> impl Iterator<Item = String> + '_ {
        self.vocabulary.iter().map(|v| format!("{}={}", self.name, v))
    }
}
