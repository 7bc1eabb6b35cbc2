//! CART regression tree (squared-error criterion).
//!
//! Nodes live in a flat arena so a fitted tree serializes as a plain list.
//! Splits are searched exhaustively over every feature and every midpoint
//! between consecutive distinct values. The first best split wins, scanning
//! features in column order, so fitting is deterministic.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::{Regressor, check_training_data, check_width};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub params: TreeParams,
    pub n_features: usize,
    pub nodes: Vec<Node>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

struct Pending {
    node: usize,
    rows: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            n_features: 0,
            nodes: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Fit on a subset of rows (duplicates allowed, as in a bootstrap draw).
    pub(crate) fn fit_rows(&mut self, x: &DMatrix<f64>, y: &DVector<f64>, rows: Vec<usize>) -> Result<(), FitError> {
        if rows.is_empty() {
            return Err(FitError::Shape("cannot grow a tree from zero rows".into()));
        }
        self.n_features = x.ncols();
        self.nodes = vec![Node::Leaf { value: 0.0 }];

        let mut stack = vec![Pending {
            node: 0,
            rows,
            depth: 0,
        }];

        while let Some(Pending { node, rows, depth }) = stack.pop() {
            let n = rows.len() as f64;
            let sum: f64 = rows.iter().map(|&r| y[r]).sum();
            let mean = sum / n;

            let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
            let too_small = rows.len() < self.params.min_samples_split.max(2);
            let pure = rows.iter().all(|&r| (y[r] - mean).abs() <= 1e-12 * mean.abs().max(1.0));

            let split = if depth_reached || too_small || pure {
                None
            } else {
                self.best_split(x, y, &rows)
            };

            let Some(split) = split else {
                self.nodes[node] = Node::Leaf { value: mean };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.into_iter().partition(|&r| x[(r, split.feature)] <= split.threshold);

            let left = self.nodes.len();
            let right = left + 1;
            self.nodes.push(Node::Leaf { value: 0.0 });
            self.nodes.push(Node::Leaf { value: 0.0 });
            self.nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            // Right first so the left subtree is expanded first.
            stack.push(Pending {
                node: right,
                rows: right_rows,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                rows: left_rows,
                depth: depth + 1,
            });
        }

        Ok(())
    }

    /// Maximise `S_l² / n_l + S_r² / n_r`, which minimises the children's SSE.
    fn best_split(&self, x: &DMatrix<f64>, y: &DVector<f64>, rows: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total: f64 = rows.iter().map(|&r| y[r]).sum();

        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..x.ncols() {
            sorted.sort_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += y[sorted[k]];
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let lo = x[(sorted[k], feature)];
                let hi = x[(sorted[k + 1], feature)];
                if lo == hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if best.as_ref().is_none_or(|b| score > b.score) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }

    fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[(row, feature)] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        self.fit_rows(x, y, (0..x.nrows()).collect())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        if self.nodes.is_empty() {
            return Err(FitError::NotFitted);
        }
        check_width(x, self.n_features)?;
        Ok(DVector::from_iterator(x.nrows(), (0..x.nrows()).map(|i| self.predict_row(x, i))))
    }
}
