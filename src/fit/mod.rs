//! Training-time fitting.
//!
//! Responsibilities:
//!
//! - seeded train/test split (`split`)
//! - held-out metrics: RMSE and R² (`metrics`)
//! - fit every candidate and pick the winner by R² (`selection`)

pub mod metrics;
pub mod selection;
pub mod split;

pub use metrics::*;
pub use selection::*;
pub use split::*;
