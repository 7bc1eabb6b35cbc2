//! Candidate regressors.
//!
//! Every candidate implements [`Regressor`], so model selection never needs to
//! know which algorithm it is scoring. Estimators are plain serde structs: the
//! winning one is persisted as-is inside the model artifact.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

pub mod boosting;
pub mod estimator;
pub mod forest;
pub mod linear;
pub mod tree;

pub use boosting::*;
pub use estimator::*;
pub use forest::*;
pub use linear::*;
pub use tree::*;

/// Uniform fit/predict capability.
pub trait Regressor {
    /// Fit in place on `x` (`n × p`) and `y` (`n`).
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError>;
}

/// Reject empty, misaligned or non-finite training data.
pub(crate) fn check_training_data(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
    if x.nrows() == 0 {
        return Err(FitError::Shape("training matrix has no rows".into()));
    }
    if x.nrows() != y.len() {
        return Err(FitError::Shape(format!(
            "matrix has {} rows but target has {} values",
            x.nrows(),
            y.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::Numerical("training data contains non-finite values".into()));
    }
    Ok(())
}

pub(crate) fn check_width(x: &DMatrix<f64>, expected: usize) -> Result<(), FitError> {
    if x.ncols() != expected {
        return Err(FitError::Shape(format!(
            "model expects {expected} features, got {}",
            x.ncols()
        )));
    }
    Ok(())
}
