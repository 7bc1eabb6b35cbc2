//! Reporting utilities: training summaries and prediction output.

pub mod format;

pub use format::*;
