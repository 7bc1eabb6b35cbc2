//! Mathematical utilities: least squares and column statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
