//! Configuration records.
//!
//! Every record has a [`Default`] matching the conventional choices
//! (α = 0.05, 95% intervals, 100 solver iterations, 10 000 Monte Carlo
//! draws) and deserializes from partial documents: missing fields fall back
//! to the default.
//!
//! ```
//! use u_inference::config::{Alternative, TestConfig};
//!
//! let cfg = TestConfig {
//!     alternative: Alternative::Greater,
//!     ..TestConfig::default()
//! };
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.alpha, 0.05);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ensure_probability, InferenceError, Result};

/// Alternative hypothesis for directional tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// H₁: parameter ≠ null value.
    #[default]
    TwoSided,
    /// H₁: parameter > null value.
    Greater,
    /// H₁: parameter < null value.
    Less,
}

/// Options shared by hypothesis tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Significance level used for the `reject` decision.
    pub alpha: f64,
    /// Alternative hypothesis.
    pub alternative: Alternative,
    /// Pool variances in the two-sample t-test (Student) instead of Welch.
    pub equal_variance: bool,
    /// Coverage of reported confidence intervals.
    pub confidence_level: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            alternative: Alternative::TwoSided,
            equal_variance: false,
            confidence_level: 0.95,
        }
    }
}

impl TestConfig {
    /// Checks that `alpha` and `confidence_level` lie in (0, 1).
    pub fn validate(&self) -> Result<()> {
        ensure_probability("alpha", self.alpha)?;
        ensure_probability("confidence_level", self.confidence_level)
    }
}

/// Limits for iterative solvers (Cox, Weibull).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Newton-Raphson iteration cap.
    pub max_iterations: usize,
    /// Stop once the largest parameter change falls below this.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    /// Checks for a positive iteration cap and a positive finite tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(InferenceError::InvalidParameter(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(InferenceError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Options for Monte Carlo estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of paired posterior draws.
    pub draws: usize,
    /// Seed for the reproducible entry points.
    pub seed: Option<u64>,
    /// Mass of the reported credible intervals.
    pub credible_level: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            draws: 10_000,
            seed: None,
            credible_level: 0.95,
        }
    }
}

impl MonteCarloConfig {
    /// Checks for a positive draw count and a credible level in (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.draws == 0 {
            return Err(InferenceError::InvalidParameter(
                "draws must be at least 1".into(),
            ));
        }
        ensure_probability("credible_level", self.credible_level)
    }
}

/// Options for time-series forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of steps to forecast (≥ 1).
    pub horizon: usize,
    /// Coverage of the prediction intervals.
    pub confidence_level: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            confidence_level: 0.95,
        }
    }
}

impl ForecastConfig {
    /// Checks for a positive horizon and a confidence level in (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(InferenceError::InvalidParameter(
                "forecast horizon must be at least 1".into(),
            ));
        }
        ensure_probability("confidence_level", self.confidence_level)
    }
}

/// All configuration sections in one document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Hypothesis test options.
    pub testing: TestConfig,
    /// Iterative solver limits.
    pub solver: SolverConfig,
    /// Monte Carlo options.
    pub monte_carlo: MonteCarloConfig,
    /// Forecast options.
    pub forecast: ForecastConfig,
}

impl InferenceConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        self.testing.validate()?;
        self.solver.validate()?;
        self.monte_carlo.validate()?;
        self.forecast.validate()
    }
}

/// Outcome of an iterative fit.
///
/// A fit that exhausts `max_iterations` still returns its last iterate;
/// `converged == false` tells the caller the estimate is approximate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    /// Whether the tolerance was met before the iteration cap.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
    /// Largest absolute parameter change in the final iteration.
    pub max_change: f64,
}
