//! Artifact store: named blobs under one directory.
//!
//! Layout (fixed file names, latest run wins):
//!
//! ```text
//! <root>/raw.csv             raw snapshot of the training source
//! <root>/preprocessor.json   FittedPreprocessor
//! <root>/model.json          ModelArtifact (winning estimator + report)
//! ```
//!
//! There is no versioning and no locking; training is the only writer.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::EvaluationReport;
use crate::error::ArtifactError;
use crate::models::Estimator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    RawSnapshot,
    Preprocessor,
    Model,
}

impl ArtifactKey {
    pub const ALL: [ArtifactKey; 3] = [ArtifactKey::RawSnapshot, ArtifactKey::Preprocessor, ArtifactKey::Model];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKey::RawSnapshot => "raw.csv",
            ArtifactKey::Preprocessor => "preprocessor.json",
            ArtifactKey::Model => "model.json",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKey::RawSnapshot => "raw snapshot",
            ArtifactKey::Preprocessor => "preprocessor",
            ArtifactKey::Model => "model",
        };
        write!(f, "{name}")
    }
}

/// Persisted winner of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub estimator: Estimator,
    pub report: EvaluationReport,
    /// Width of the feature vectors the estimator was fitted on.
    pub n_features: usize,
    pub low_quality: bool,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: ArtifactKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    pub fn exists(&self, key: ArtifactKey) -> bool {
        self.path(key).is_file()
    }

    /// Write `bytes` for `key`, creating the root directory if needed.
    pub fn save_bytes(&self, key: ArtifactKey, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        let path = self.path(key);
        std::fs::write(&path, bytes).map_err(|e| io_error(&path, e))?;
        tracing::debug!(artifact = %key, path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(path)
    }

    pub fn load_bytes(&self, key: ArtifactKey) -> Result<Vec<u8>, ArtifactError> {
        let path = self.path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::NotFound {
                key: key.to_string(),
                path: path.display().to_string(),
            }),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Serialize `value` as JSON under `key`.
    pub fn save<T: Serialize>(&self, key: ArtifactKey, value: &T) -> Result<PathBuf, ArtifactError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Corrupt {
            key: key.to_string(),
            reason: format!("failed to serialize: {e}"),
        })?;
        self.save_bytes(key, &bytes)
    }

    pub fn load<T: DeserializeOwned>(&self, key: ArtifactKey) -> Result<T, ArtifactError> {
        let bytes = self.load_bytes(key)?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Keys in `keys` whose artifact file is absent.
    pub fn missing(&self, keys: &[ArtifactKey]) -> Vec<ArtifactKey> {
        keys.iter().copied().filter(|k| !self.exists(*k)).collect()
    }
}

fn io_error(path: &Path, err: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
