//! Held-out scoring metrics.

use nalgebra::DVector;

pub fn rmse(y: &DVector<f64>, y_hat: &DVector<f64>) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    ((y - y_hat).norm_squared() / y.len() as f64).sqrt()
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant target (`SS_tot = 0`) scores 1.0 for a perfect fit and 0.0
/// otherwise.
pub fn r2_score(y: &DVector<f64>, y_hat: &DVector<f64>) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    let ss_res = (y - y_hat).norm_squared();
    let ss_tot = y.add_scalar(-y.mean()).norm_squared();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
