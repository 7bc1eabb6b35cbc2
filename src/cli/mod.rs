//! Command-line parsing for the house price trainer/predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hpp", version, about = "Hyderabad house price model: train, predict, sample")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a transaction CSV, fit the preprocessor, select a model and write artifacts.
    Train(TrainArgs),
    /// Price one property with the trained artifacts.
    Predict(PredictArgs),
    /// Write a synthetic transaction CSV.
    Sample(SampleArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Source CSV (one row per transaction).
    #[arg(short = 'd', long, value_name = "CSV")]
    pub data: PathBuf,

    /// Artifact directory (defaults to $HPP_ARTIFACTS_DIR, then `artifacts`).
    #[arg(short = 'a', long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Fraction of rows held out for scoring.
    #[arg(long, default_value_t = 0.2)]
    pub test_ratio: f64,

    /// Seed for the train/test shuffle.
    #[arg(long, default_value_t = 42)]
    pub split_seed: u64,

    /// Seed for stochastic candidates (random forest bootstrap).
    #[arg(long, default_value_t = 42)]
    pub model_seed: u64,

    /// Year property age is measured against.
    #[arg(long, default_value_t = crate::domain::DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i32,

    /// Winners scoring below this held-out R² are flagged as low quality.
    #[arg(long, default_value_t = 0.6)]
    pub min_r2: f64,

    /// Export the evaluation report to JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["json", "record", "fields"])))]
pub struct PredictArgs {
    /// Artifact directory (defaults to $HPP_ARTIFACTS_DIR, then `artifacts`).
    #[arg(short = 'a', long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Record as an inline JSON object.
    #[arg(long, value_name = "OBJECT")]
    pub json: Option<String>,

    /// Record as a JSON file.
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Record field, repeatable (e.g. `--field Bedrooms=3`).
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Reference year the artifacts are expected to use.
    #[arg(long, default_value_t = crate::domain::DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i32,

    /// Print the full response as JSON.
    #[arg(long)]
    pub output_json: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// Number of rows to generate.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
