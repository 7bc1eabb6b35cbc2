//! Fit/transform preprocessing.
//!
//! [`fit`] learns imputation, scaling and vocabulary statistics from a training
//! table; [`FittedPreprocessor::transform`] applies them to any table without
//! touching the statistics. The fitted value is what gets persisted, and the
//! prediction path only ever uses a loaded one.
//!
//! Output column order is fixed at fit time:
//!
//! ```text
//! [ numerical (schema order) | cat_1 one-hot | cat_2 one-hot | ... ]
//! ```

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{AgeRule, Cell, Schema, Table};
use crate::error::SchemaError;

pub mod categorical;
pub mod numeric;

pub use categorical::CategoricalColumn;
pub use numeric::NumericColumn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    /// Engineered-feature rule in force when this preprocessor was fitted.
    pub age: AgeRule,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
    /// Output column names, in output order.
    pub feature_names: Vec<String>,
}

/// Learn preprocessing statistics from an engineered training table.
///
/// Only the schema's numerical and categorical columns are read; everything
/// else in `table` is ignored.
pub fn fit(schema: &Schema, table: &Table) -> Result<FittedPreprocessor, SchemaError> {
    let numeric = schema
        .numerical
        .iter()
        .map(|name| NumericColumn::fit(name, fit_input(table, name)?))
        .collect::<Result<Vec<_>, _>>()?;

    let categorical = schema
        .categorical
        .iter()
        .map(|name| CategoricalColumn::fit(name, fit_input(table, name)?))
        .collect::<Result<Vec<_>, _>>()?;

    let mut feature_names: Vec<String> = numeric.iter().map(|c| c.name.clone()).collect();
    for col in &categorical {
        feature_names.extend(col.output_names());
    }

    let ignored: Vec<&str> = table
        .column_names()
        .filter(|c| !schema.feature_columns().any(|f| f == *c))
        .collect();
    if !ignored.is_empty() {
        tracing::debug!(?ignored, "preprocessor ignores columns outside the schema");
    }

    Ok(FittedPreprocessor {
        age: schema.age.clone(),
        numeric,
        categorical,
        feature_names,
    })
}

impl FittedPreprocessor {
    pub fn n_features_out(&self) -> usize {
        self.feature_names.len()
    }

    pub fn reference_year(&self) -> i32 {
        self.age.reference_year
    }

    pub fn numerical_names(&self) -> Vec<String> {
        self.numeric.iter().map(|c| c.name.clone()).collect()
    }

    pub fn categorical_names(&self) -> Vec<String> {
        self.categorical.iter().map(|c| c.name.clone()).collect()
    }

    /// Map `table` onto the fitted feature space (`n_rows × n_features_out`).
    pub fn transform(&self, table: &Table) -> Result<DMatrix<f64>, SchemaError> {
        let n = table.n_rows();
        let mut out = DMatrix::<f64>::zeros(n, self.n_features_out());

        for (j, col) in self.numeric.iter().enumerate() {
            let cells = required(table, &col.name)?;
            for (i, cell) in cells.iter().enumerate() {
                out[(i, j)] = col.apply(cell, i)?;
            }
        }

        let mut offset = self.numeric.len();
        for col in &self.categorical {
            let cells = required(table, &col.name)?;
            let mut slot = vec![0.0; col.width()];
            for (i, cell) in cells.iter().enumerate() {
                col.encode(cell, &mut slot);
                for (k, v) in slot.iter().enumerate() {
                    out[(i, offset + k)] = *v;
                }
            }
            offset += col.width();
        }

        Ok(out)
    }
}

/// A column absent at fit time has nothing to learn from.
fn fit_input<'a>(table: &'a Table, name: &str) -> Result<&'a [Cell], SchemaError> {
    table.column(name).ok_or_else(|| SchemaError::EmptyColumn {
        column: name.to_string(),
    })
}

fn required<'a>(table: &'a Table, name: &str) -> Result<&'a [Cell], SchemaError> {
    table.column(name).ok_or_else(|| SchemaError::MissingColumn {
        column: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::generate_sample;
    use crate::domain::LOCATION_NAME;
    use crate::features::engineer;

    fn engineered(rows: usize, seed: u64) -> (Schema, Table) {
        let schema = Schema::default();
        let raw = generate_sample(rows, seed);
        let table = engineer(&raw, &schema.age).unwrap();
        (schema, table)
    }

    #[test]
    fn output_layout_is_numeric_then_one_hot() {
        let (schema, table) = engineered(80, 7);
        let pre = fit(&schema, &table).unwrap();

        let expected_width: usize =
            schema.numerical.len() + pre.categorical.iter().map(|c| c.width()).sum::<usize>();
        assert_eq!(pre.n_features_out(), expected_width);
        assert_eq!(pre.feature_names[0], "Area_SqFt");
        assert!(pre.feature_names[schema.numerical.len()].starts_with("Location_Name="));

        let x = pre.transform(&table).unwrap();
        assert_eq!(x.shape(), (80, expected_width));
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn scaled_training_columns_are_standardised() {
        let (schema, table) = engineered(120, 3);
        let pre = fit(&schema, &table).unwrap();
        let x = pre.transform(&table).unwrap();
        for j in 0..schema.numerical.len() {
            let col = x.column(j);
            let mean = col.mean();
            assert!(mean.abs() < 1e-9, "column {j} mean {mean}");
        }
    }

    #[test]
    fn transform_is_repeatable() {
        let (schema, table) = engineered(60, 11);
        let pre = fit(&schema, &table).unwrap();
        let before = pre.clone();
        let a = pre.transform(&table).unwrap();
        let b = pre.transform(&table).unwrap();
        assert_eq!(a, b);
        assert_eq!(pre, before);
    }

    #[test]
    fn unseen_categories_keep_dimensionality() {
        let (schema, table) = engineered(60, 5);
        let pre = fit(&schema, &table).unwrap();

        let mut unseen = table.select_rows(&[0]);
        unseen.set_column(LOCATION_NAME, vec![Cell::Text("Atlantis".into())]);
        let known = table.select_rows(&[0]);

        let xa = pre.transform(&unseen).unwrap();
        let xb = pre.transform(&known).unwrap();
        assert_eq!(xa.ncols(), xb.ncols());

        let loc = &pre.categorical[0];
        let start = schema.numerical.len();
        let block_sum: f64 = (start..start + loc.width()).map(|j| xa[(0, j)]).sum();
        assert_eq!(block_sum, 0.0);
        let known_sum: f64 = (start..start + loc.width()).map(|j| xb[(0, j)]).sum();
        assert_eq!(known_sum, 1.0);
    }

    #[test]
    fn missing_feature_column_fails_fit() {
        let (schema, mut table) = engineered(30, 1);
        table.drop_columns(["Bathrooms"]);
        let err = fit(&schema, &table).unwrap_err();
        assert_eq!(err, SchemaError::EmptyColumn { column: "Bathrooms".into() });
    }

    #[test]
    fn transform_reports_missing_column() {
        let (schema, table) = engineered(30, 1);
        let pre = fit(&schema, &table).unwrap();
        let mut partial = table.clone();
        partial.drop_columns(["Floors"]);
        let err = pre.transform(&partial).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn { column: "Floors".into() });
    }
}
