//! Training orchestrator.
//!
//! Stages run strictly in order and each one persists its own artifact:
//!
//! ```text
//! Ingesting     read CSV, check raw columns          -> raw.csv
//! Transforming  engineer, drop, split, fit/transform -> preprocessor.json
//! Training      fit candidates, select winner        -> model.json
//! ```
//!
//! `Ok(TrainingRun)` is the done state. Any failure stops the run and comes
//! back as a [`StageError`] naming the stage; there is no retry and artifacts
//! written by earlier stages are left in place.

use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::domain::{Cell, ColumnAudit, Schema, Table, TrainConfig};
use crate::error::{AppError, PipelineError, SchemaError};
use crate::features::engineer;
use crate::fit::{Selection, select, train_test_split};
use crate::io::{ArtifactKey, ArtifactStore, ModelArtifact, load_table};
use crate::models::{Candidate, Estimator, default_candidates};
use crate::preprocess::{self, FittedPreprocessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingesting,
    Transforming,
    Training,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Ingesting => "ingesting",
            Stage::Transforming => "transforming",
            Stage::Training => "training",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage failure: the stage that aborted and why.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl From<StageError> for AppError {
    fn from(err: StageError) -> Self {
        let message = err.to_string();
        let code = AppError::from(err.source).exit_code();
        AppError::new(code, message)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_skipped: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub audit: ColumnAudit,
    pub n_features: usize,
    pub selection: Selection<Estimator>,
    pub artifacts: Vec<PathBuf>,
}

struct Ingested {
    table: Table,
    rows_read: usize,
    rows_skipped: usize,
}

struct Transformed {
    audit: ColumnAudit,
    preprocessor: FittedPreprocessor,
    train_x: DMatrix<f64>,
    train_y: DVector<f64>,
    test_x: DMatrix<f64>,
    test_y: DVector<f64>,
}

/// Run ingest → transform → train with the default candidates, writing all
/// three artifacts.
pub fn run_training(config: &TrainConfig, schema: &Schema) -> Result<TrainingRun, StageError> {
    run_training_with(config, schema, default_candidates(config.model_seed))
}

/// [`run_training`] over an explicit candidate list.
pub fn run_training_with(
    config: &TrainConfig,
    schema: &Schema,
    candidates: Vec<Candidate<Estimator>>,
) -> Result<TrainingRun, StageError> {
    let store = ArtifactStore::new(&config.artifacts_dir);
    let mut artifacts = Vec::new();

    let ingested = run_stage(Stage::Ingesting, || {
        // A mis-specified schema must never reach a fit.
        schema.validate()?;
        let data = load_table(&config.data_path, &schema.target)?;
        schema.check_raw_inputs(data.table.column_names())?;
        artifacts.push(store.save_bytes(ArtifactKey::RawSnapshot, &data.raw)?);
        Ok(Ingested {
            rows_read: data.rows_read,
            rows_skipped: data.row_errors.len(),
            table: data.table,
        })
    })?;
    let rows_used = ingested.table.n_rows();

    let transformed = run_stage(Stage::Transforming, || {
        let t = transform(schema, config, ingested.table)?;
        artifacts.push(store.save(ArtifactKey::Preprocessor, &t.preprocessor)?);
        Ok(t)
    })?;

    let n_features = transformed.preprocessor.n_features_out();
    let selection = run_stage(Stage::Training, || {
        let selection = select(
            &transformed.train_x,
            &transformed.train_y,
            &transformed.test_x,
            &transformed.test_y,
            candidates,
            config.min_r2,
        )?;
        let artifact = ModelArtifact {
            name: selection.winner.clone(),
            estimator: selection.model.clone(),
            report: selection.report.clone(),
            n_features,
            low_quality: selection.low_quality,
            trained_at: Utc::now(),
        };
        artifacts.push(store.save(ArtifactKey::Model, &artifact)?);
        Ok(selection)
    })?;

    Ok(TrainingRun {
        rows_read: ingested.rows_read,
        rows_used,
        rows_skipped: ingested.rows_skipped,
        n_train: transformed.train_y.len(),
        n_test: transformed.test_y.len(),
        audit: transformed.audit,
        n_features,
        selection,
        artifacts,
    })
}

fn run_stage<T>(stage: Stage, f: impl FnOnce() -> Result<T, PipelineError>) -> Result<T, StageError> {
    tracing::info!(stage = stage.name(), "stage started");
    match f() {
        Ok(value) => {
            tracing::info!(stage = stage.name(), "stage finished");
            Ok(value)
        }
        Err(source) => {
            tracing::error!(stage = stage.name(), error = %source, "stage failed");
            Err(StageError { stage, source })
        }
    }
}

fn transform(schema: &Schema, config: &TrainConfig, table: Table) -> Result<Transformed, PipelineError> {
    let mut table = engineer(&table, &schema.age)?;

    let audit = schema.audit_columns(table.column_names())?;
    if !audit.dropped_listed.is_empty() {
        tracing::info!(columns = ?audit.dropped_listed, "dropping listed columns");
    }
    if !audit.dropped_unlisted.is_empty() {
        tracing::warn!(columns = ?audit.dropped_unlisted, "dropping columns the schema does not name");
    }

    let target = target_vector(&table, &schema.target)?;
    table.drop_columns(audit.dropped_listed.iter().chain(&audit.dropped_unlisted).map(String::as_str));

    let split = train_test_split(table.n_rows(), config.test_ratio, config.split_seed)?;
    let train = table.select_rows(&split.train);
    let test = table.select_rows(&split.test);
    tracing::info!(train = split.train.len(), test = split.test.len(), "split rows");

    let preprocessor = preprocess::fit(schema, &train)?;
    let train_x = preprocessor.transform(&train)?;
    let test_x = preprocessor.transform(&test)?;
    tracing::info!(features = preprocessor.n_features_out(), "fitted preprocessor");

    Ok(Transformed {
        audit,
        preprocessor,
        train_x,
        train_y: pick(&target, &split.train),
        test_x,
        test_y: pick(&target, &split.test),
    })
}

fn target_vector(table: &Table, target: &str) -> Result<DVector<f64>, SchemaError> {
    let cells = table.column(target).ok_or_else(|| SchemaError::MissingColumn {
        column: target.to_string(),
    })?;
    let values = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Number(v) => Ok(*v),
            _ => Err(SchemaError::NonNumeric {
                column: target.to_string(),
                row,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DVector::from_vec(values))
}

fn pick(values: &DVector<f64>, rows: &[usize]) -> DVector<f64> {
    DVector::from_iterator(rows.len(), rows.iter().map(|&r| values[r]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::generate_sample;
    use crate::domain::{LOCATION_NAME, PropertyRecord};
    use crate::io::write_table_csv;
    use crate::serve::PredictionService;
    use serde_json::json;

    const UNSEEN_IN_TRAINING: &str = "Brand New Layout";

    /// 100-row source where one location appears only in the test split.
    fn write_source(dir: &std::path::Path) -> PathBuf {
        let mut table = generate_sample(100, 21);
        let split = train_test_split(100, 0.2, 42).unwrap();
        let mut locations = table.column(LOCATION_NAME).unwrap().to_vec();
        locations[split.test[0]] = Cell::Text(UNSEEN_IN_TRAINING.into());
        table.set_column(LOCATION_NAME, locations);

        let path = dir.join("houses.csv");
        write_table_csv(&path, &table).unwrap();
        path
    }

    #[test]
    fn happy_path_trains_and_predicts_unseen_location() {
        let tmp = tempfile::tempdir().unwrap();
        let data = write_source(tmp.path());
        let config = TrainConfig::new(&data, tmp.path().join("artifacts"));
        let schema = Schema::default();

        let run = run_training(&config, &schema).unwrap();
        assert_eq!(run.rows_used, 100);
        assert_eq!((run.n_train, run.n_test), (80, 20));
        assert_eq!(run.selection.report.len(), 6);
        assert_eq!(run.artifacts.len(), 3);
        assert!(run.audit.dropped_listed.iter().any(|c| c == "Property_ID"));

        let pre: FittedPreprocessor = ArtifactStore::new(&config.artifacts_dir)
            .load(ArtifactKey::Preprocessor)
            .unwrap();
        let loc = pre.categorical.iter().find(|c| c.name == LOCATION_NAME).unwrap();
        assert!(!loc.vocabulary.iter().any(|v| v == UNSEEN_IN_TRAINING));

        let service = PredictionService::load(&ArtifactStore::new(&config.artifacts_dir), &schema).unwrap();
        let record = PropertyRecord::from_json(&json!({
            "Location_Name": "Never Heard Of It",
            "Area_SqFt": 1800,
            "Bedrooms": 3,
            "Bathrooms": 3,
            "Property_Type": "Villa",
            "Furnishing_Status": "Fully-Furnished",
            "Year_Built": 2012,
            "Gated_Community": "Yes",
            "Balcony": "No",
            "Floors": 2,
            "Facing_Direction": "North"
        }))
        .unwrap();
        let price = service.predict(&record).unwrap();
        assert!(price.is_finite());
    }

    #[test]
    fn misspecified_schema_fails_before_any_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let data = write_source(tmp.path());
        let config = TrainConfig::new(&data, tmp.path().join("artifacts"));
        let mut schema = Schema::default();
        schema.categorical.push("Parking_Slots".into());

        let err = run_training(&config, &schema).unwrap_err();
        assert_eq!(err.stage, Stage::Ingesting);
        assert!(matches!(err.source, PipelineError::Schema(SchemaError::Integrity(_))));
        assert!(!config.artifacts_dir.exists());
    }

    #[test]
    fn missing_raw_column_names_the_column() {
        let tmp = tempfile::tempdir().unwrap();
        let mut table = generate_sample(40, 3);
        table.drop_columns(["Facing_Direction"]);
        let data = tmp.path().join("houses.csv");
        write_table_csv(&data, &table).unwrap();

        let config = TrainConfig::new(&data, tmp.path().join("artifacts"));
        let err = run_training(&config, &Schema::default()).unwrap_err();
        assert!(matches!(
            err.source,
            PipelineError::Schema(SchemaError::MissingColumn { ref column }) if column == "Facing_Direction"
        ));
    }

    #[test]
    fn failed_transforming_keeps_only_raw_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let data = write_source(tmp.path());
        let mut config = TrainConfig::new(&data, tmp.path().join("artifacts"));
        config.test_ratio = 1.5;

        let err = run_training(&config, &Schema::default()).unwrap_err();
        assert_eq!(err.stage, Stage::Transforming);
        let store = ArtifactStore::new(&config.artifacts_dir);
        assert!(store.exists(ArtifactKey::RawSnapshot));
        assert!(!store.exists(ArtifactKey::Preprocessor));
        assert!(!store.exists(ArtifactKey::Model));

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().starts_with("transforming stage failed"));
    }

    #[test]
    fn failed_training_keeps_raw_snapshot_and_preprocessor() {
        use crate::error::FitError;
        use crate::models::{LinearRegression, Ridge};

        let tmp = tempfile::tempdir().unwrap();
        let data = write_source(tmp.path());
        let config = TrainConfig::new(&data, tmp.path().join("artifacts"));
        let candidates = vec![
            Candidate::new("Linear Regression", Estimator::Linear(LinearRegression::default())),
            Candidate::new("Ridge", Estimator::Ridge(Ridge::new(-1.0))),
        ];

        let err = run_training_with(&config, &Schema::default(), candidates).unwrap_err();
        assert_eq!(err.stage, Stage::Training);
        assert!(matches!(err.source, PipelineError::Fit(FitError::Candidate { ref name, .. }) if name == "Ridge"));

        let store = ArtifactStore::new(&config.artifacts_dir);
        assert!(store.exists(ArtifactKey::RawSnapshot));
        let pre: FittedPreprocessor = store.load(ArtifactKey::Preprocessor).unwrap();
        assert!(pre.n_features_out() > 0);
        assert!(!store.exists(ArtifactKey::Model));

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.to_string().starts_with("training stage failed"));
    }
}
