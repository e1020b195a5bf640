//! # u-inference
//!
//! Statistical inference: special functions, hypothesis tests, Bayesian
//! updating, survival analysis, and time-series forecasting.
//!
//! Every operation is a pure function over plain `f64` slices (or a
//! [`matrix::Matrix`] of covariates) that returns an immutable result
//! record or a typed [`InferenceError`]. Nothing is persisted and no global
//! state is shared, so calls may run concurrently from any thread.
//!
//! ## Modules
//!
//! - [`special`]: gamma, beta, incomplete gamma/beta, error function, normal quantile
//! - [`distribution`]: Normal, Student's t, χ², F and Beta distributions
//! - [`stats`]: descriptive statistics and ranking helpers
//! - [`matrix`]: small dense matrices with Gauss-Jordan inversion
//! - [`testing`]: t-tests, ANOVA, χ² tests, Mann-Whitney U, Kolmogorov-Smirnov, correlation
//! - [`bayes`]: Beta-Binomial updating, Monte Carlo A/B tests, Bayesian linear regression
//! - [`survival`]: Kaplan-Meier, log-rank, Cox proportional hazards, Weibull MLE
//! - [`timeseries`]: exponential smoothing, decomposition, seasonality, forecasts
//! - [`config`]: configuration records with defaults and validation
//! - [`error`]: the crate error type
//!
//! ## Conventions
//!
//! - Invalid input is an error, never a silent default.
//! - Iterative fits report a [`config::Convergence`] record instead of
//!   failing when they hit the iteration cap.
//! - Randomized procedures take an explicit `&mut impl Rng`.
//!
//! ## Example
//!
//! ```
//! use u_inference::config::TestConfig;
//! use u_inference::testing::one_sample_t_test;
//!
//! let r = one_sample_t_test(&[68.0, 70.0, 72.0, 74.0, 76.0], 70.0, &TestConfig::default()).unwrap();
//! assert!((r.statistic - 2.0_f64.sqrt()).abs() < 1e-10);
//! assert!(!r.reject);
//! ```

pub mod bayes;
pub mod config;
pub mod distribution;
pub mod error;
pub mod matrix;
pub mod special;
pub mod stats;
pub mod survival;
pub mod testing;
pub mod timeseries;

pub use error::{InferenceError, Result};
