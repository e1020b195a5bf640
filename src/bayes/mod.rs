//! Bayesian inference.
//!
//! Conjugate Beta-Binomial updating, Monte Carlo A/B comparison of two
//! conversion rates, and closed-form Bayesian linear regression.
//!
//! # Methods
//!
//! - [`update_beta_prior`]: Beta prior + binomial counts → Beta posterior
//!   with an equal-tailed credible interval
//! - [`ab_test`] / [`ab_test_seeded`]: P(treatment > control) and relative
//!   lift from paired posterior draws
//! - [`bayesian_linear_regression`]: Gaussian prior on the coefficients,
//!   posterior mean and covariance, per-row predictive uncertainty
//! - [`sampling`]: Box-Muller normal, Marsaglia-Tsang gamma and gamma-ratio
//!   beta variates driven by a caller-supplied generator
//!
//! # References
//!
//! - Gelman, A. et al. (2013). *Bayesian Data Analysis*, 3rd ed., ch. 2, 14.
//! - Marsaglia, G. & Tsang, W.W. (2000). "A simple method for generating
//!   gamma variables", *ACM TOMS* 26(3), pp. 363-372.

mod ab;
mod conjugate;
mod regression;
pub mod sampling;

pub use ab::{ab_test, ab_test_seeded, AbTestResult, ArmCounts};
pub use conjugate::{update_beta_prior, BetaPosterior, BetaPrior};
pub use regression::{bayesian_linear_regression, BayesianRegression};
