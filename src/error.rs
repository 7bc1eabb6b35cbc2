//! Error types.
//!
//! Library components return [`PipelineError`], one variant family per failure
//! class (schema, artifact, fit, input validation). The binary converts those
//! into [`AppError`], which carries the process exit code:
//!
//! - `2` input, schema or validation problems
//! - `3` not enough usable data
//! - `4` numerical / fitting failures
//! - `5` artifacts missing or unreadable

use thiserror::Error;

use crate::domain::ValidationError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let code = match &err {
            PipelineError::Schema(_)
            | PipelineError::InputValidation(_)
            | PipelineError::Ingest(_)
            | PipelineError::Config(_) => 2,
            PipelineError::InsufficientData(_) => 3,
            PipelineError::Fit(_) => 4,
            PipelineError::Artifact(_) => 5,
        };
        AppError::new(code, err.to_string())
    }
}

/// Errors raised by the train/predict core.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("fit error: {0}")]
    Fit(#[from] FitError),

    #[error("invalid input: {0}")]
    InputValidation(#[from] ValidationError),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid setting: {0}")]
    Config(String),
}

/// Required column missing, misnamed, or a mis-specified schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("column `{column}` has no usable values")]
    EmptyColumn { column: String },

    #[error("column `{column}` has a non-numeric value at row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("schema integrity violated: {0}")]
    Integrity(String),
}

/// Model or preprocessor artifact missing, corrupt, or incompatible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("artifact `{key}` not found at {path}")]
    NotFound { key: String, path: String },

    #[error("artifacts not found: {}. Run the training pipeline first.", .0.join(", "))]
    Missing(Vec<String>),

    #[error("artifact `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("artifact does not match the current schema: {0}")]
    SchemaMismatch(String),

    #[error("artifact i/o failed at {path}: {reason}")]
    Io { path: String, reason: String },
}

/// A candidate regressor failed to fit or predict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("candidate `{name}` failed: {reason}")]
    Candidate { name: String, reason: String },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("{0}")]
    Numerical(String),

    #[error("model used before fit")]
    NotFitted,

    #[error("no candidate models were supplied")]
    NoCandidates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let schema: AppError = PipelineError::from(SchemaError::MissingColumn {
            column: "Year_Built".into(),
        })
        .into();
        assert_eq!(schema.exit_code(), 2);

        let artifact: AppError = PipelineError::from(ArtifactError::Missing(vec!["model".into()])).into();
        assert_eq!(artifact.exit_code(), 5);
        assert!(artifact.to_string().contains("artifacts not found: model"));

        let fit: AppError = PipelineError::from(FitError::NoCandidates).into();
        assert_eq!(fit.exit_code(), 4);
    }
}
