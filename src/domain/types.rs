//! Shared evaluation and configuration types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during model selection
//! - persisted inside the model artifact
//! - exported to JSON for later inspection

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Held-out scores for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub name: String,
    pub r2: f64,
    pub rmse: f64,
}

/// Per-candidate scores in candidate iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub scores: Vec<ModelScore>,
}

impl EvaluationReport {
    pub fn get(&self, name: &str) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// A full training run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub artifacts_dir: PathBuf,
    /// Fraction of rows held out for scoring.
    pub test_ratio: f64,
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    /// Seed for stochastic candidates (bootstrap sampling).
    pub model_seed: u64,
    pub reference_year: i32,
    /// Winners scoring below this R² are flagged, not discarded.
    pub min_r2: f64,
    pub export_report: Option<PathBuf>,
}

impl TrainConfig {
    pub fn new(data_path: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            artifacts_dir: artifacts_dir.into(),
            test_ratio: 0.2,
            split_seed: 42,
            model_seed: 42,
            reference_year: crate::domain::DEFAULT_REFERENCE_YEAR,
            min_r2: 0.6,
            export_report: None,
        }
    }
}
