//! Gradient boosting with squared loss.
//!
//! ```text
//! F_0(x) = mean(y)
//! F_m(x) = F_{m-1}(x) + learning_rate * h_m(x),   h_m fitted to y - F_{m-1}(x)
//! ```

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::{DecisionTree, Regressor, TreeParams, check_training_data, check_width};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_stages: usize,
    pub learning_rate: f64,
    pub params: TreeParams,
    pub init: f64,
    pub stages: Vec<DecisionTree>,
}

impl GradientBoosting {
    pub fn new(n_stages: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_stages,
            learning_rate,
            params: TreeParams {
                max_depth: Some(max_depth),
                ..TreeParams::default()
            },
            init: 0.0,
            stages: Vec::new(),
        }
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        if self.n_stages == 0 {
            return Err(FitError::Shape("boosting needs at least one stage".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(FitError::Numerical(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        self.init = y.mean();
        self.stages.clear();
        let mut fitted = DVector::<f64>::from_element(y.len(), self.init);

        for _ in 0..self.n_stages {
            let residual = y - &fitted;
            let mut tree = DecisionTree::new(self.params);
            tree.fit(x, &residual)?;
            fitted += tree.predict(x)? * self.learning_rate;
            self.stages.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        let Some(first) = self.stages.first() else {
            return Err(FitError::NotFitted);
        };
        check_width(x, first.n_features)?;

        let mut out = DVector::<f64>::from_element(x.nrows(), self.init);
        for tree in &self.stages {
            out += tree.predict(x)? * self.learning_rate;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boosting_reduces_training_error() {
        let rows: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let x = DMatrix::from_row_slice(30, 1, &rows);
        let y = DVector::from_iterator(30, (0..30).map(|i| ((i as f64) / 4.0).sin() * 10.0));

        let sse = |m: &GradientBoosting| {
            let p = m.predict(&x).unwrap();
            (p - &y).norm_squared()
        };

        let mut short = GradientBoosting::new(5, 0.1, 3);
        let mut long = GradientBoosting::new(100, 0.1, 3);
        short.fit(&x, &y).unwrap();
        long.fit(&x, &y).unwrap();

        assert!(sse(&long) < sse(&short));
        assert!((short.init - y.mean()).abs() < 1e-12);
    }

    #[test]
    fn unfitted_model_refuses_to_predict() {
        let m = GradientBoosting::new(10, 0.1, 3);
        assert_eq!(m.predict(&DMatrix::zeros(1, 1)).unwrap_err(), FitError::NotFitted);
    }

    #[test]
    fn zero_stages_is_rejected_at_fit() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let mut m = GradientBoosting::new(0, 0.1, 3);
        assert!(matches!(m.fit(&x, &y), Err(FitError::Shape(_))));
    }
}
