//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the schema registry (`Schema`, column-name constants)
//! - the in-memory table (`Table`, `Cell`)
//! - the typed prediction record (`PropertyRecord`) and its `ValidationError`
//! - evaluation outputs (`EvaluationReport`, `ModelScore`) and run configuration

pub mod record;
pub mod schema;
pub mod table;
pub mod types;

pub use record::*;
pub use schema::*;
pub use table::*;
pub use types::*;
