//! Closed set of persistable estimators and the default candidate list.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::{DecisionTree, GradientBoosting, Lasso, LinearRegression, RandomForest, Regressor, Ridge};

/// Any estimator that can be stored in the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearRegression),
    Lasso(Lasso),
    Ridge(Ridge),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl Estimator {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Estimator::Linear(m) => m,
            Estimator::Lasso(m) => m,
            Estimator::Ridge(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::GradientBoosting(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Estimator::Linear(m) => m,
            Estimator::Lasso(m) => m,
            Estimator::Ridge(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::RandomForest(m) => m,
            Estimator::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        self.as_regressor().predict(x)
    }
}

/// Named, untrained estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<R> {
    pub name: String,
    pub model: R,
}

impl<R> Candidate<R> {
    pub fn new(name: impl Into<String>, model: R) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

pub const FOREST_TREES: usize = 100;
pub const BOOSTING_STAGES: usize = 100;
pub const BOOSTING_LEARNING_RATE: f64 = 0.1;
pub const BOOSTING_DEPTH: usize = 3;

/// The default candidate set, in evaluation order.
pub fn default_candidates(seed: u64) -> Vec<Candidate<Estimator>> {
    vec![
        Candidate::new("Linear Regression", Estimator::Linear(LinearRegression::default())),
        Candidate::new("Lasso", Estimator::Lasso(Lasso::new(1.0))),
        Candidate::new("Ridge", Estimator::Ridge(Ridge::new(1.0))),
        Candidate::new("Decision Tree", Estimator::DecisionTree(DecisionTree::default())),
        Candidate::new(
            "Random Forest",
            Estimator::RandomForest(RandomForest::new(FOREST_TREES, seed)),
        ),
        Candidate::new(
            "Gradient Boosting",
            Estimator::GradientBoosting(GradientBoosting::new(
                BOOSTING_STAGES,
                BOOSTING_LEARNING_RATE,
                BOOSTING_DEPTH,
            )),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order_is_fixed() {
        let names: Vec<String> = default_candidates(0).into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                "Linear Regression",
                "Lasso",
                "Ridge",
                "Decision Tree",
                "Random Forest",
                "Gradient Boosting"
            ]
        );
    }

    #[test]
    fn fitted_estimator_survives_json() {
        let x = DMatrix::from_row_slice(5, 1, &[0.1, 0.7, 1.3, 2.9, 3.3]);
        let y = DVector::from_row_slice(&[1.0 / 3.0, 2.2, 2.9, 7.1, 8.0]);
        let mut est = Estimator::Ridge(Ridge::new(0.3));
        est.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&est).unwrap();
        let back: Estimator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, est);
        assert_eq!(back.predict(&x).unwrap(), est.predict(&x).unwrap());
    }
}
