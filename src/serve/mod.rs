//! Prediction service.
//!
//! [`PredictionService`] holds a loaded preprocessor and model and is
//! immutable afterwards, so one instance can be shared across threads without
//! locking. [`SharedPredictor`] loads it lazily on first use behind a
//! single-flight guard: concurrent first callers wait for one load instead of
//! each reading the artifacts.
//!
//! Caller-facing classification:
//!
//! | error                          | class               | status |
//! |--------------------------------|---------------------|--------|
//! | invalid/missing request fields | `BadRequest`        | 400    |
//! | artifacts never written        | `ArtifactsNotReady` | 503    |
//! | anything else                  | `Internal`          | 500    |

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{PropertyRecord, Schema};
use crate::error::{ArtifactError, FitError, PipelineError};
use crate::features::engineer;
use crate::io::{ArtifactKey, ArtifactStore, ModelArtifact};
use crate::models::Regressor;
use crate::preprocess::FittedPreprocessor;

pub const CURRENCY_UNIT: &str = "Lakhs";

/// Artifacts the service cannot start without.
const REQUIRED: [ArtifactKey; 2] = [ArtifactKey::Preprocessor, ArtifactKey::Model];

#[derive(Debug, Clone)]
pub struct PredictionService {
    preprocessor: FittedPreprocessor,
    model: ModelArtifact,
}

impl PredictionService {
    /// Load and cross-check both artifacts.
    ///
    /// Absence is checked before anything is read, so a missing model is
    /// reported even if the preprocessor is also missing.
    pub fn load(store: &ArtifactStore, schema: &Schema) -> Result<Self, ArtifactError> {
        let missing = store.missing(&REQUIRED);
        if !missing.is_empty() {
            return Err(ArtifactError::Missing(missing.iter().map(|k| k.to_string()).collect()));
        }

        let preprocessor: FittedPreprocessor = store.load(ArtifactKey::Preprocessor)?;
        let model: ModelArtifact = store.load(ArtifactKey::Model)?;

        if let Some(issue) = schema.compatibility_issue(
            &preprocessor.numerical_names(),
            &preprocessor.categorical_names(),
            preprocessor.reference_year(),
        ) {
            return Err(ArtifactError::SchemaMismatch(issue));
        }
        if model.n_features != preprocessor.n_features_out() {
            return Err(ArtifactError::SchemaMismatch(format!(
                "model expects {} features, preprocessor produces {}",
                model.n_features,
                preprocessor.n_features_out()
            )));
        }

        tracing::info!(
            model = %model.name,
            features = model.n_features,
            trained_at = %model.trained_at,
            "prediction artifacts loaded"
        );
        if model.low_quality {
            tracing::warn!(model = %model.name, "serving a model flagged as low quality");
        }

        Ok(Self { preprocessor, model })
    }

    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    /// Price one property, in lakhs.
    pub fn predict(&self, record: &PropertyRecord) -> Result<f64, PipelineError> {
        let table = engineer(&record.to_table(), &self.preprocessor.age)?;
        let x = self.preprocessor.transform(&table)?;
        let y = self.model.estimator.predict(&x)?;
        match y.get(0) {
            Some(v) if v.is_finite() => Ok(*v),
            _ => Err(FitError::Numerical("model produced no finite prediction".into()).into()),
        }
    }

    pub fn predict_fields(&self, fields: &Map<String, Value>) -> Result<f64, PipelineError> {
        let record = PropertyRecord::from_fields(fields)?;
        self.predict(&record)
    }
}

/// Lazily loaded, process-wide [`PredictionService`].
///
/// A failed load is not cached; the next call tries again.
#[derive(Debug)]
pub struct SharedPredictor {
    store: ArtifactStore,
    schema: Schema,
    service: OnceLock<Arc<PredictionService>>,
    load_guard: Mutex<()>,
    loads: AtomicUsize,
}

impl SharedPredictor {
    pub fn new(store: ArtifactStore, schema: Schema) -> Self {
        Self {
            store,
            schema,
            service: OnceLock::new(),
            load_guard: Mutex::new(()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn get(&self) -> Result<Arc<PredictionService>, ArtifactError> {
        if let Some(service) = self.service.get() {
            return Ok(Arc::clone(service));
        }

        let _guard = self.load_guard.lock();
        if let Some(service) = self.service.get() {
            return Ok(Arc::clone(service));
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let service = Arc::new(PredictionService::load(&self.store, &self.schema)?);
        // Only this thread can set the cell while the guard is held.
        let _ = self.service.set(Arc::clone(&service));
        Ok(service)
    }

    /// Number of load attempts so far.
    pub fn load_attempts(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Validate, predict and classify one JSON request body.
    pub fn respond(&self, body: &Value) -> PredictResponse {
        let outcome = PropertyRecord::from_json(body)
            .map_err(PipelineError::from)
            .and_then(|record| {
                let service = self.get()?;
                service.predict(&record)
            });

        match outcome {
            Ok(price) => PredictResponse::ok(price),
            Err(err) => PredictResponse::error(&err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    BadRequest,
    ArtifactsNotReady,
    Internal,
}

impl ErrorClass {
    pub fn of(err: &PipelineError) -> Self {
        match err {
            PipelineError::InputValidation(_) | PipelineError::Schema(_) => ErrorClass::BadRequest,
            PipelineError::Artifact(ArtifactError::Missing(_) | ArtifactError::NotFound { .. }) => {
                ErrorClass::ArtifactsNotReady
            }
            _ => ErrorClass::Internal,
        }
    }

    pub fn status(self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::ArtifactsNotReady => 503,
            ErrorClass::Internal => 500,
        }
    }

    fn message(self) -> &'static str {
        match self {
            ErrorClass::BadRequest => "Invalid prediction request",
            ErrorClass::ArtifactsNotReady => "Model artifacts are not ready",
            ErrorClass::Internal => "Prediction failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub status: u16,
    pub predicted_price_lakhs: Option<f64>,
    pub currency_unit: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PredictResponse {
    pub fn ok(price: f64) -> Self {
        Self {
            success: true,
            status: 200,
            // Two decimals, as quoted to users.
            predicted_price_lakhs: Some((price * 100.0).round() / 100.0),
            currency_unit: CURRENCY_UNIT.to_string(),
            message: "Prediction successful".to_string(),
            error_class: None,
            details: None,
        }
    }

    pub fn error(err: &PipelineError) -> Self {
        let class = ErrorClass::of(err);
        let details = match err {
            PipelineError::InputValidation(v) => v.to_string(),
            PipelineError::Artifact(a) => a.to_string(),
            other => other.to_string(),
        };
        if class == ErrorClass::Internal {
            tracing::error!(error = %err, "prediction failed");
        }
        Self {
            success: false,
            status: class.status(),
            predicted_price_lakhs: None,
            currency_unit: CURRENCY_UNIT.to_string(),
            message: class.message().to_string(),
            error_class: Some(class),
            details: Some(details),
        }
    }
}
