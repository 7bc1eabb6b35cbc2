//! Linear candidates: ordinary least squares, ridge and lasso.
//!
//! All three fit an unpenalised intercept. Ridge and lasso do this by centring
//! the design matrix and target, solving for the weights, then recovering
//!
//! ```text
//! intercept = mean(y) - mean(x) · w
//! ```

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::solve_least_squares;
use crate::models::{Regressor, check_training_data, check_width};

/// Fitted linear parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearCoefficients {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl LinearCoefficients {
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        check_width(x, self.weights.len())?;
        let w = DVector::from_column_slice(&self.weights);
        Ok((x * w).add_scalar(self.intercept))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Option<LinearCoefficients>,
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        let (n, p) = x.shape();

        // Column 0 is the intercept.
        let mut design = DMatrix::<f64>::from_element(n, p + 1, 1.0);
        design.view_mut((0, 1), (n, p)).copy_from(x);

        let beta = solve_least_squares(&design, y)
            .ok_or_else(|| FitError::Numerical("least squares solve failed".into()))?;

        self.coefficients = Some(LinearCoefficients {
            intercept: beta[0],
            weights: beta.iter().skip(1).copied().collect(),
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        self.coefficients.as_ref().ok_or(FitError::NotFitted)?.predict(x)
    }
}

/// L2-penalised least squares: `||y - Xw||² + alpha ||w||²`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ridge {
    pub alpha: f64,
    pub coefficients: Option<LinearCoefficients>,
}

impl Ridge {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
        }
    }
}

impl Regressor for Ridge {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(FitError::Numerical(format!("ridge alpha must be positive, got {}", self.alpha)));
        }
        let centred = Centred::new(x, y);
        let p = x.ncols();

        let xt = centred.x.transpose();
        let gram = &xt * &centred.x + DMatrix::<f64>::identity(p, p) * self.alpha;
        let rhs = &xt * &centred.y;

        let w = gram
            .cholesky()
            .map(|c| c.solve(&rhs))
            .ok_or_else(|| FitError::Numerical("ridge normal equations are not positive definite".into()))?;

        self.coefficients = Some(centred.coefficients(w.as_slice().to_vec()));
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        self.coefficients.as_ref().ok_or(FitError::NotFitted)?.predict(x)
    }
}

/// L1-penalised least squares, solved by cyclic coordinate descent:
///
/// ```text
/// minimize (1 / 2n) ||y - Xw||² + alpha ||w||₁
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lasso {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub coefficients: Option<LinearCoefficients>,
}

impl Lasso {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 1000,
            tol: 1e-4,
            coefficients: None,
        }
    }
}

impl Regressor for Lasso {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), FitError> {
        check_training_data(x, y)?;
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(FitError::Numerical(format!("lasso alpha must be non-negative, got {}", self.alpha)));
        }
        let centred = Centred::new(x, y);
        let (n, p) = centred.x.shape();
        let n_f = n as f64;

        let col_sq: Vec<f64> = (0..p).map(|j| centred.x.column(j).norm_squared() / n_f).collect();
        let mut w = vec![0.0; p];
        let mut residual = centred.y.clone();

        let y_scale = centred.y.amax().max(1.0);
        for _ in 0..self.max_iter {
            let mut max_step = 0.0_f64;
            for j in 0..p {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let col = centred.x.column(j);
                let rho = col.dot(&residual) / n_f + col_sq[j] * w[j];
                let updated = soft_threshold(rho, self.alpha) / col_sq[j];
                let step = updated - w[j];
                if step != 0.0 {
                    residual.axpy(-step, &col, 1.0);
                    w[j] = updated;
                    max_step = max_step.max(step.abs());
                }
            }
            if max_step <= self.tol * y_scale {
                break;
            }
        }

        if w.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Numerical("lasso coordinate descent diverged".into()));
        }
        self.coefficients = Some(centred.coefficients(w));
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, FitError> {
        self.coefficients.as_ref().ok_or(FitError::NotFitted)?.predict(x)
    }
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

/// Column-centred copy of a training problem.
struct Centred {
    x: DMatrix<f64>,
    y: DVector<f64>,
    x_mean: Vec<f64>,
    y_mean: f64,
}

impl Centred {
    fn new(x: &DMatrix<f64>, y: &DVector<f64>) -> Self {
        let x_mean: Vec<f64> = x.column_iter().map(|c| c.mean()).collect();
        let y_mean = y.mean();
        let mut xc = x.clone();
        for (j, mut col) in xc.column_iter_mut().enumerate() {
            col.add_scalar_mut(-x_mean[j]);
        }
        Self {
            x: xc,
            y: y.add_scalar(-y_mean),
            x_mean,
            y_mean,
        }
    }

    fn coefficients(&self, weights: Vec<f64>) -> LinearCoefficients {
        let offset: f64 = self.x_mean.iter().zip(&weights).map(|(m, w)| m * w).sum();
        LinearCoefficients {
            intercept: self.y_mean - offset,
            weights,
        }
    }
}
