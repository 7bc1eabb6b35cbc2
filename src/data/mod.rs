//! Data sources other than user-supplied CSV files.

pub mod sample;

pub use sample::*;
