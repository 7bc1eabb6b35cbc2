//! Random forest: bagged CART trees averaged at prediction time.
//!
//! Per-tree seeds are drawn up front from one seeded generator, then trees are
//! grown in parallel. Each tree only ever sees its own generator, so the fitted
//! forest does not depend on thread scheduling.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::{DecisionTree, Regressor, TreeParams, check_training_data, check_width};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_trees: usize,
    pub seed: u64,
    pub params: TreeParams,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            params: TreeParams::default(),
            trees: Vec::new(),
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        if self.n_trees == 0 {
            return Err(FitError::Shape("forest needs at least one tree".into()));
        }

        let n = x.nrows();
        let mut master = StdRng::seed_from_u64(self.seed);
        let seeds: Vec<u64> = (0..self.n_trees).map(|_| master.r#gen()).collect();
        let params = self.params;

        let trees = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree = DecisionTree::new(params);
                tree.fit_rows(x, y, rows)?;
                Ok::<_, FitError>(tree)
            })
            .collect::<Result<Vec<_>, FitError>>()?;

        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        let Some(first) = self.trees.first() else {
            return Err(FitError::NotFitted);
        };
        check_width(x, first.n_features)?;

        let mut sum = DVector::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            sum += tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DMatrix<f64>, DVector<f64>) {
        let rows: Vec<f64> = (0..40).flat_map(|i| [i as f64, (i % 5) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| 2.0 * i as f64 + (i % 5) as f64).collect();
        (DMatrix::from_row_slice(40, 2, &rows), DVector::from_vec(y))
    }

    #[test]
    fn same_seed_gives_identical_forest() {
        let (x, y) = data();
        let mut a = RandomForest::new(12, 7);
        let mut b = RandomForest::new(12, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);

        let mut c = RandomForest::new(12, 8);
        c.fit(&x, &y).unwrap();
        assert_ne!(a.trees, c.trees);
    }

    #[test]
    fn forest_tracks_the_trend() {
        let (x, y) = data();
        let mut forest = RandomForest::new(20, 1);
        forest.fit(&x, &y).unwrap();
        let pred = forest.predict(&x).unwrap();
        let max_err = pred.iter().zip(y.iter()).map(|(p, t)| (p - t).abs()).fold(0.0, f64::max);
        assert!(max_err < 10.0, "max error {max_err}");
        assert_eq!(forest.trees.len(), 20);
    }
}
