//! Model selection by held-out R².
//!
//! Every candidate is fitted on the training matrix and scored on the test
//! matrix. Selection rules:
//!
//! 1. The winner has the strictly greatest R²; on a tie the earlier candidate
//!    keeps the win, so the result only depends on candidate order.
//! 2. No candidate is excluded for a low score. A winner below the quality
//!    threshold is flagged, never discarded.
//! 3. A candidate that fails to fit or predict aborts the whole run.

use nalgebra::{DMatrix, DVector};

use crate::domain::{EvaluationReport, ModelScore};
use crate::error::FitError;
use crate::fit::metrics::{r2_score, rmse};
use crate::models::{Candidate, Regressor};

/// Output of a selection run.
#[derive(Debug, Clone)]
pub struct Selection<R> {
    pub winner: String,
    pub model: R,
    pub report: EvaluationReport,
    /// Winner's R² fell below the configured threshold.
    pub low_quality: bool,
}

impl<R> Selection<R> {
    pub fn winner_score(&self) -> Option<&ModelScore> {
        self.report.get(&self.winner)
    }
}

/// Fit, score and pick the best candidate.
pub fn select<R: Regressor>(
    train_x: &DMatrix<f64>,
    train_y: &DVector<f64>,
    test_x: &DMatrix<f64>,
    test_y: &DVector<f64>,
    candidates: Vec<Candidate<R>>,
    min_r2: f64,
) -> Result<Selection<R>, FitError> {
    if candidates.is_empty() {
        return Err(FitError::NoCandidates);
    }

    let mut report = EvaluationReport::default();
    let mut fitted = Vec::with_capacity(candidates.len());
    let mut best: Option<usize> = None;

    for (idx, Candidate { name, mut model }) in candidates.into_iter().enumerate() {
        let score = evaluate(&mut model, train_x, train_y, test_x, test_y).map_err(|e| FitError::Candidate {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let score = ModelScore {
            name,
            r2: score.0,
            rmse: score.1,
        };
        tracing::info!(model = %score.name, r2 = score.r2, rmse = score.rmse, "candidate evaluated");

        if best.is_none_or(|b| rank_key(score.r2) > rank_key(report.scores[b].r2)) {
            best = Some(idx);
        }
        report.scores.push(score);
        fitted.push(model);
    }

    let best = best.ok_or(FitError::NoCandidates)?;
    let winner = report.scores[best].name.clone();
    let winner_r2 = report.scores[best].r2;
    let model = fitted.into_iter().nth(best).ok_or(FitError::NoCandidates)?;

    let low_quality = !(winner_r2 >= min_r2);
    if low_quality {
        tracing::warn!(model = %winner, r2 = winner_r2, threshold = min_r2, "best model is below the quality threshold");
    } else {
        tracing::info!(model = %winner, r2 = winner_r2, "selected model");
    }

    Ok(Selection {
        winner,
        model,
        report,
        low_quality,
    })
}

fn evaluate<R: Regressor>(
    model: &mut R,
    train_x: &DMatrix<f64>,
    train_y: &DVector<f64>,
    test_x: &DMatrix<f64>,
    test_y: &DVector<f64>,
) -> Result<(f64, f64), FitError> {
    model.fit(train_x, train_y)?;
    let pred = model.predict(test_x)?;
    if pred.len() != test_y.len() {
        return Err(FitError::Shape(format!(
            "{} predictions for {} test rows",
            pred.len(),
            test_y.len()
        )));
    }
    if pred.iter().any(|v| !v.is_finite()) {
        return Err(FitError::Numerical("non-finite prediction on the test split".into()));
    }
    Ok((r2_score(test_y, &pred), rmse(test_y, &pred)))
}

/// NaN never beats a real score.
fn rank_key(r2: f64) -> f64 {
    if r2.is_nan() { f64::NEG_INFINITY } else { r2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::generate_sample;
    use crate::domain::Schema;
    use crate::features::engineer;
    use crate::fit::split::train_test_split;
    use crate::models::{LinearRegression, Ridge, default_candidates};
    use crate::preprocess;

    struct Problem {
        train_x: DMatrix<f64>,
        train_y: DVector<f64>,
        test_x: DMatrix<f64>,
        test_y: DVector<f64>,
    }

    fn housing(rows: usize, seed: u64) -> Problem {
        let schema = Schema::default();
        let table = engineer(&generate_sample(rows, seed), &schema.age).unwrap();
        let split = train_test_split(rows, 0.2, 42).unwrap();
        let train = table.select_rows(&split.train);
        let test = table.select_rows(&split.test);

        let pre = preprocess::fit(&schema, &train).unwrap();
        let target = |t: &crate::domain::Table| {
            let col = t.column(&schema.target).unwrap();
            DVector::from_iterator(col.len(), col.iter().map(|c| c.as_f64().unwrap()))
        };
        Problem {
            train_x: pre.transform(&train).unwrap(),
            train_y: target(&train),
            test_x: pre.transform(&test).unwrap(),
            test_y: target(&test),
        }
    }

    fn line() -> Problem {
        let x = DMatrix::from_row_slice(6, 1, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);
        Problem {
            train_x: x.rows(0, 4).into_owned(),
            train_y: y.rows(0, 4).into_owned(),
            test_x: x.rows(4, 2).into_owned(),
            test_y: y.rows(4, 2).into_owned(),
        }
    }

    #[test]
    fn selection_is_deterministic() {
        let p = housing(100, 5);
        let run = || select(&p.train_x, &p.train_y, &p.test_x, &p.test_y, default_candidates(42), 0.6).unwrap();
        let a = run();
        let b = run();

        assert_eq!(a.winner, b.winner);
        assert_eq!(a.report.len(), 6);
        for (x, y) in a.report.scores.iter().zip(&b.report.scores) {
            assert_eq!(x.name, y.name);
            assert!((x.r2 - y.r2).abs() <= 1e-9 * x.r2.abs().max(1.0));
            assert!((x.rmse - y.rmse).abs() <= 1e-9 * x.rmse.abs().max(1.0));
        }

        let best = a.report.scores.iter().map(|s| s.r2).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(a.winner_score().unwrap().r2, best);
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let p = line();
        let candidates = vec![
            Candidate::new("first", LinearRegression::default()),
            Candidate::new("second", LinearRegression::default()),
        ];
        let sel = select(&p.train_x, &p.train_y, &p.test_x, &p.test_y, candidates, 0.6).unwrap();
        assert_eq!(sel.winner, "first");
        assert_eq!(sel.report.scores[0].r2, sel.report.scores[1].r2);
        assert!(!sel.low_quality);
    }

    #[test]
    fn one_failing_candidate_aborts_the_run() {
        let p = line();
        let candidates = vec![Candidate::new("ok", Ridge::new(1.0)), Candidate::new("broken", Ridge::new(-1.0))];
        let err = select(&p.train_x, &p.train_y, &p.test_x, &p.test_y, candidates, 0.6).unwrap_err();
        assert!(matches!(err, FitError::Candidate { ref name, .. } if name == "broken"));
    }

    #[test]
    fn weak_winner_is_flagged_not_dropped() {
        let p = line();
        let candidates = vec![Candidate::new("only", Ridge::new(1e6))];
        let sel = select(&p.train_x, &p.train_y, &p.test_x, &p.test_y, candidates, 0.6).unwrap();
        assert_eq!(sel.winner, "only");
        assert!(sel.low_quality);
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let p = line();
        let err = select::<Ridge>(&p.train_x, &p.train_y, &p.test_x, &p.test_y, Vec::new(), 0.6).unwrap_err();
        assert_eq!(err, FitError::NoCandidates);
    }
}
