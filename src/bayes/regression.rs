//! Bayesian linear regression with a Gaussian coefficient prior.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_len, InferenceError, Result};
use crate::matrix::Matrix;

/// Posterior of a Bayesian linear regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianRegression {
    /// Posterior mean of the coefficients, μ.
    pub posterior_mean: Vec<f64>,
    /// Posterior covariance of the coefficients, Σ = σ²(XᵀX + λI)⁻¹.
    pub posterior_covariance: Matrix,
    /// Fitted values Xμ for the design rows.
    pub predictions: Vec<f64>,
    /// Variance of each fitted mean, xᵢᵀΣxᵢ.
    pub uncertainty: Vec<f64>,
    /// Residual noise variance σ² (residual sum of squares / (n − p)).
    pub noise_variance: f64,
}

impl BayesianRegression {
    /// Mean and predictive variance (xᵀΣx + σ²) at a new design row.
    pub fn predict(&self, x: &[f64]) -> Result<(f64, f64)> {
        if x.len() != self.posterior_mean.len() {
            return Err(InferenceError::DimensionMismatch {
                what: "prediction row",
                expected: self.posterior_mean.len(),
                actual: x.len(),
            });
        }
        let mean = x.iter().zip(&self.posterior_mean).map(|(a, b)| a * b).sum();
        let var = self.posterior_covariance.quadratic_form(x)? + self.noise_variance;
        Ok((mean, var))
    }
}

/// Conjugate Bayesian linear regression.
///
/// # Algorithm
///
/// With prior β ~ N(m₀, σ²/λ · I):
///
/// A = XᵀX + λI, μ = A⁻¹(Xᵀy + λm₀), Σ = σ²A⁻¹,
///
/// where σ² is estimated from the residuals of μ with n − p degrees of
/// freedom. `prior_mean` defaults to zero. Include a column of ones in
/// `design` for an intercept.
///
/// # Errors
///
/// - `DimensionMismatch` if `targets` or `prior_mean` has the wrong length
/// - `InsufficientData` for fewer than 3 rows or no more rows than columns
/// - `InvalidParameter` for a negative or non-finite precision
/// - `SingularMatrix` if XᵀX + λI cannot be inverted (only possible with λ = 0)
///
/// # Examples
///
/// ```
/// use u_inference::bayes::bayesian_linear_regression;
/// use u_inference::matrix::Matrix;
///
/// let x = Matrix::from_rows(&[
///     vec![1.0, 0.0],
///     vec![1.0, 1.0],
///     vec![1.0, 2.0],
///     vec![1.0, 3.0],
/// ]).unwrap();
/// let y = [1.0, 3.1, 4.9, 7.0];
/// let fit = bayesian_linear_regression(&x, &y, None, 1e-6).unwrap();
/// assert!((fit.posterior_mean[1] - 1.98).abs() < 1e-3);
/// ```
pub fn bayesian_linear_regression(
    design: &Matrix,
    targets: &[f64],
    prior_mean: Option<&[f64]>,
    prior_precision: f64,
) -> Result<BayesianRegression> {
    let n = design.rows();
    let p = design.cols();
    if targets.len() != n {
        return Err(InferenceError::DimensionMismatch {
            what: "regression targets",
            expected: n,
            actual: targets.len(),
        });
    }
    ensure_len("regression observations", n, 3)?;
    ensure_len("regression observations beyond coefficients", n, p + 1)?;
    ensure_finite("design matrix", design.as_slice())?;
    ensure_finite("regression targets", targets)?;
    if !prior_precision.is_finite() || prior_precision < 0.0 {
        return Err(InferenceError::InvalidParameter(format!(
            "prior precision must be non-negative, got {prior_precision}"
        )));
    }

    let zeros = vec![0.0; p];
    let m0 = prior_mean.unwrap_or(&zeros);
    if m0.len() != p {
        return Err(InferenceError::DimensionMismatch {
            what: "prior mean",
            expected: p,
            actual: m0.len(),
        });
    }
    ensure_finite("prior mean", m0)?;

    let xt = design.transpose();
    let mut gram = xt.mul_mat(design)?;
    gram.add_diagonal(prior_precision);
    let gram_inv = gram.inverse()?;

    let mut rhs = xt.mul_vec(targets)?;
    for (r, &m) in rhs.iter_mut().zip(m0) {
        *r += prior_precision * m;
    }
    let posterior_mean = gram_inv.mul_vec(&rhs)?;

    let predictions = design.mul_vec(&posterior_mean)?;
    let rss: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(f, y)| (y - f).powi(2))
        .sum();
    let noise_variance = rss / (n - p) as f64;

    let mut posterior_covariance = gram_inv;
    for v in posterior_covariance.as_mut_slice() {
        *v *= noise_variance;
    }

    let uncertainty = (0..n)
        .map(|i| posterior_covariance.quadratic_form(design.row(i)))
        .collect::<Result<Vec<f64>>>()?;

    Ok(BayesianRegression {
        posterior_mean,
        posterior_covariance,
        predictions,
        uncertainty,
        noise_variance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line_design(xs: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = xs.iter().map(|&x| vec![1.0, x]).collect();
        Matrix::from_rows(&rows).expect("rectangular")
    }

    #[test]
    fn test_weak_prior_recovers_least_squares() {
        let x = line_design(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let fit = bayesian_linear_regression(&x, &y, None, 1e-10).expect("should fit");
        assert_abs_diff_eq!(fit.posterior_mean[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.posterior_mean[1], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.noise_variance, 0.0, epsilon = 1e-12);
        for (p, y) in fit.predictions.iter().zip(&y) {
            assert_abs_diff_eq!(*p, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_strong_prior_shrinks_toward_prior_mean() {
        let x = line_design(&[0.0, 1.0, 2.0, 3.0]);
        let y = [0.0, 2.0, 4.0, 6.0];
        let m0 = [0.0, 5.0];
        let fit = bayesian_linear_regression(&x, &y, Some(&m0), 1e6).expect("should fit");
        assert_abs_diff_eq!(fit.posterior_mean[1], 5.0, epsilon = 1e-3);
        assert_abs_diff_eq!(fit.posterior_mean[0], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_uncertainty_is_quadratic_form_of_covariance() {
        let x = line_design(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = [0.9, 3.2, 4.8, 7.1, 9.2, 10.8];
        let fit = bayesian_linear_regression(&x, &y, None, 0.1).expect("should fit");
        assert!(fit.noise_variance > 0.0);
        let s = &fit.posterior_covariance;
        for (i, &u) in fit.uncertainty.iter().enumerate() {
            let xi = x.row(i);
            let expected = s[(0, 0)] * xi[0] * xi[0]
                + 2.0 * s[(0, 1)] * xi[0] * xi[1]
                + s[(1, 1)] * xi[1] * xi[1];
            assert_abs_diff_eq!(u, expected, epsilon = 1e-12);
            assert!(u > 0.0);
        }
        // extrapolation is less certain than the centre of the data
        let (_, centre) = fit.predict(&[1.0, 2.5]).expect("predict");
        let (_, far) = fit.predict(&[1.0, 20.0]).expect("predict");
        assert!(far > centre);
    }

    #[test]
    fn test_input_validation() {
        let x = line_design(&[0.0, 1.0, 2.0]);
        assert!(matches!(
            bayesian_linear_regression(&x, &[1.0, 2.0], None, 1.0),
            Err(InferenceError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            bayesian_linear_regression(&x, &[1.0, 2.0, 3.0], Some(&[0.0]), 1.0),
            Err(InferenceError::DimensionMismatch { what: "prior mean", .. })
        ));
        assert!(bayesian_linear_regression(&x, &[1.0, 2.0, 3.0], None, -1.0).is_err());
        let short = line_design(&[0.0, 1.0]);
        assert!(matches!(
            bayesian_linear_regression(&short, &[1.0, 2.0], None, 1.0),
            Err(InferenceError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_collinear_design_without_prior_is_singular() {
        let x = Matrix::from_rows(&[
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ])
        .expect("rectangular");
        let err = bayesian_linear_regression(&x, &[1.0, 2.0, 3.0, 4.0], None, 0.0).unwrap_err();
        assert!(matches!(err, InferenceError::SingularMatrix { .. }));
    }
}
