//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (plus `.env` fallbacks)
//! - runs the training pipeline and prints its summary
//! - answers single predictions from the stored artifacts
//! - writes synthetic samples and optional exports

use std::path::PathBuf;

use clap::Parser;
use serde_json::{Map, Value};

use crate::cli::{Command, PredictArgs, SampleArgs, TrainArgs};
use crate::domain::{Schema, TrainConfig};
use crate::error::AppError;
use crate::io::ArtifactStore;
use crate::serve::{ErrorClass, SharedPredictor};

pub mod pipeline;

/// Environment fallback for `--artifacts`.
pub const ARTIFACTS_ENV: &str = "HPP_ARTIFACTS_DIR";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Entry point for the `hpp` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Predict(args) => handle_predict(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args);
    let schema = Schema::hyderabad(config.reference_year);
    let run = pipeline::run_training(&config, &schema)?;

    println!("{}", crate::report::format_training_summary(&run, &config));

    if let Some(path) = &config.export_report {
        crate::io::export::write_report_json(path, &run.selection.report)?;
    }
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let body = request_body(&args)?;
    let store = ArtifactStore::new(resolve_artifacts_dir(args.artifacts.clone()));
    let predictor = SharedPredictor::new(store, Schema::hyderabad(args.reference_year));

    let resp = predictor.respond(&body);
    if args.output_json {
        let json = serde_json::to_string_pretty(&resp)
            .map_err(|e| AppError::new(4, format!("Failed to serialize response: {e}")))?;
        println!("{json}");
    } else if resp.success {
        println!("{}", crate::report::format_prediction(&resp));
    }

    match resp.error_class {
        None => Ok(()),
        Some(class) => Err(AppError::new(
            exit_code_for(class),
            crate::report::format_prediction(&resp),
        )),
    }
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let table = crate::data::sample::generate_sample(args.rows, args.seed);
    crate::io::export::write_table_csv(&args.output, &table)?;
    println!("Wrote {} rows to {}", table.n_rows(), args.output.display());
    Ok(())
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        data_path: args.data.clone(),
        artifacts_dir: resolve_artifacts_dir(args.artifacts.clone()),
        test_ratio: args.test_ratio,
        split_seed: args.split_seed,
        model_seed: args.model_seed,
        reference_year: args.reference_year,
        min_r2: args.min_r2,
        export_report: args.export_report.clone(),
    }
}

/// `--artifacts`, else `$HPP_ARTIFACTS_DIR`, else `artifacts`.
pub fn resolve_artifacts_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(ARTIFACTS_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR))
}

/// Build the JSON request body from whichever input flag was given.
fn request_body(args: &PredictArgs) -> Result<Value, AppError> {
    if let Some(text) = &args.json {
        return serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid --json object: {e}")));
    }
    if let Some(path) = &args.record {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read record '{}': {e}", path.display())))?;
        return serde_json::from_str(&text)
            .map_err(|e| AppError::new(2, format!("Invalid JSON in '{}': {e}", path.display())));
    }
    fields_to_object(&args.fields).map(Value::Object)
}

fn fields_to_object(fields: &[String]) -> Result<Map<String, Value>, AppError> {
    fields
        .iter()
        .map(|f| {
            let (name, value) = f
                .split_once('=')
                .ok_or_else(|| AppError::new(2, format!("Expected NAME=VALUE, got '{f}'")))?;
            Ok((name.trim().to_string(), Value::String(value.trim().to_string())))
        })
        .collect()
}

fn exit_code_for(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::BadRequest => 2,
        ErrorClass::ArtifactsNotReady => 5,
        ErrorClass::Internal => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_artifacts_flag_wins() {
        assert_eq!(resolve_artifacts_dir(Some("x".into())), PathBuf::from("x"));
    }

    #[test]
    fn field_pairs_become_string_values() {
        let map = fields_to_object(&["Bedrooms=3".into(), " Location_Name = Kokapet ".into()]).unwrap();
        assert_eq!(map["Bedrooms"], Value::String("3".into()));
        assert_eq!(map["Location_Name"], Value::String("Kokapet".into()));
        assert_eq!(fields_to_object(&["oops".into()]).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn config_carries_train_flags() {
        let cli = crate::cli::Cli::try_parse_from([
            "hpp",
            "train",
            "-d",
            "houses.csv",
            "-a",
            "out",
            "--reference-year",
            "2026",
            "--min-r2",
            "0.7",
        ])
        .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        let config = train_config_from_args(&args);
        assert_eq!(config.artifacts_dir, PathBuf::from("out"));
        assert_eq!(config.reference_year, 2026);
        assert_eq!(config.min_r2, 0.7);
    }
}
