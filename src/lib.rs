//! `house-price` library crate.
//!
//! The binary (`hpp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the prediction service can be embedded behind any request layer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocess;
pub mod report;
pub mod serve;
