//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::TrainingRun;
use crate::domain::{EvaluationReport, TrainConfig};
use crate::serve::PredictResponse;

/// Format the run summary (dataset counts + per-candidate diagnostics + winner).
pub fn format_training_summary(run: &TrainingRun, config: &TrainConfig) -> String {
    let mut out = String::new();

    out.push_str("=== hpp - House Price Model Training ===\n");
    out.push_str(&format!("Source: {}\n", config.data_path.display()));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        run.rows_read, run.rows_used, run.rows_skipped
    ));
    out.push_str(&format!(
        "Split: train={} test={} (ratio={}, seed={})\n",
        run.n_train, run.n_test, config.test_ratio, config.split_seed
    ));
    out.push_str(&format!(
        "Features: {} kept columns -> {} model inputs (reference year {})\n",
        run.audit.kept.len(),
        run.n_features,
        config.reference_year
    ));
    if !run.audit.dropped_unlisted.is_empty() {
        out.push_str(&format!("Unlisted columns dropped: {}\n", run.audit.dropped_unlisted.join(", ")));
    }

    out.push_str("\nModel diagnostics (held-out):\n");
    out.push_str(&format_scores(&run.selection.report, &run.selection.winner));

    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {}\n", run.selection.winner));
    if let Some(score) = run.selection.winner_score() {
        out.push_str(&format!("- R2={:.4} RMSE={:.3} lakhs\n", score.r2, score.rmse));
    }
    if run.selection.low_quality {
        out.push_str(&format!(
            "- WARNING: R2 below {:.2}; consider more data or retraining\n",
            config.min_r2
        ));
    }

    out.push_str("\nArtifacts:\n");
    for path in &run.artifacts {
        out.push_str(&format!("- {}\n", path.display()));
    }

    out
}

/// Candidate table, winner marked with `*`.
pub fn format_scores(report: &EvaluationReport, winner: &str) -> String {
    let mut out = String::new();
    for s in &report.scores {
        let chosen = if s.name == winner { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<20} R2={:>8.4} RMSE={:>10.3}\n",
            truncate(&s.name, 20),
            s.r2,
            s.rmse
        ));
    }
    out
}

pub fn format_prediction(resp: &PredictResponse) -> String {
    match resp.predicted_price_lakhs {
        Some(price) if resp.success => format!("Predicted price: {price:.2} {}", resp.currency_unit),
        _ => format!(
            "{} ({}): {}",
            resp.message,
            resp.status,
            resp.details.as_deref().unwrap_or("no details")
        ),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnAudit, ModelScore};
    use crate::fit::Selection;
    use crate::models::{Estimator, LinearRegression};

    fn run(low_quality: bool) -> TrainingRun {
        let report = EvaluationReport {
            scores: vec![
                ModelScore {
                    name: "Linear Regression".into(),
                    r2: 0.71,
                    rmse: 20.5,
                },
                ModelScore {
                    name: "Random Forest".into(),
                    r2: 0.88,
                    rmse: 12.25,
                },
            ],
        };
        TrainingRun {
            rows_read: 102,
            rows_used: 100,
            rows_skipped: 2,
            n_train: 80,
            n_test: 20,
            audit: ColumnAudit {
                kept: vec!["Area_SqFt".into()],
                dropped_listed: vec![],
                dropped_unlisted: vec!["Mystery".into()],
            },
            n_features: 42,
            selection: Selection {
                winner: "Random Forest".into(),
                model: Estimator::Linear(LinearRegression::default()),
                report,
                low_quality,
            },
            artifacts: vec![],
        }
    }

    #[test]
    fn summary_marks_the_winner() {
        let config = TrainConfig::new("houses.csv", "artifacts");
        let text = format_training_summary(&run(false), &config);
        assert!(text.contains("Rows: read=102 used=100 skipped=2"));
        assert!(text.contains("* Random Forest"));
        assert!(text.contains("  Linear Regression"));
        assert!(text.contains("Unlisted columns dropped: Mystery"));
        assert!(!text.contains("WARNING"));
    }

    #[test]
    fn summary_flags_low_quality() {
        let config = TrainConfig::new("houses.csv", "artifacts");
        let text = format_training_summary(&run(true), &config);
        assert!(text.contains("WARNING: R2 below 0.60"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Gradient Boosting", 8), "Gradien.");
        assert_eq!(truncate("Ridge", 8), "Ridge");
    }
}
