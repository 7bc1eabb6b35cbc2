//! Input/output helpers.
//!
//! - CSV ingest + row validation (`ingest`)
//! - artifact persistence (`artifacts`)
//! - table/report exports (`export`)

pub mod artifacts;
pub mod export;
pub mod ingest;

pub use artifacts::*;
pub use export::*;
pub use ingest::*;
