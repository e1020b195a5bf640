//! Beta-Binomial conjugate updating.

use serde::{Deserialize, Serialize};

use crate::distribution::Beta;
use crate::error::{ensure_probability, InferenceError, Result};

/// Bisection budget for credible-interval endpoints.
const INTERVAL_MAX_ITER: usize = 100;

/// CDF-space tolerance for credible-interval endpoints.
const INTERVAL_TOL: f64 = 1e-6;

/// Default credible mass.
const DEFAULT_LEVEL: f64 = 0.95;

/// Beta(α, β) prior on a success probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    /// Prior pseudo-successes (> 0).
    pub alpha: f64,
    /// Prior pseudo-failures (> 0).
    pub beta: f64,
}

impl BetaPrior {
    /// Creates a prior; both shapes must be positive and finite.
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        for (name, value) in [("prior alpha", alpha), ("prior beta", beta)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InferenceError::InvalidParameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(Self { alpha, beta })
    }

    /// The flat Beta(1, 1) prior.
    pub fn uniform() -> Self {
        Self { alpha: 1.0, beta: 1.0 }
    }
}

impl Default for BetaPrior {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Beta posterior with its summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    /// Posterior α' = α + successes.
    pub alpha: f64,
    /// Posterior β' = β + failures.
    pub beta: f64,
    /// α' / (α' + β').
    pub mean: f64,
    /// (α'−1)/(α'+β'−2); `None` unless both shapes exceed 1.
    pub mode: Option<f64>,
    /// α'β' / ((α'+β')²(α'+β'+1)).
    pub variance: f64,
    /// Equal-tailed credible interval.
    pub credible_interval: (f64, f64),
    /// Mass of `credible_interval`.
    pub credible_level: f64,
}

impl BetaPosterior {
    /// Summarizes Beta(α, β) with an equal-tailed interval of mass `level`.
    pub fn from_shapes(alpha: f64, beta: f64, level: f64) -> Result<Self> {
        ensure_probability("credible level", level)?;
        let dist = Beta::new(alpha, beta)?;
        let credible_interval = equal_tailed(&dist, level)?;
        Ok(Self {
            alpha,
            beta,
            mean: dist.mean(),
            mode: dist.mode(),
            variance: dist.variance(),
            credible_interval,
            credible_level: level,
        })
    }

    /// Equal-tailed credible interval at another level.
    pub fn interval(&self, level: f64) -> Result<(f64, f64)> {
        ensure_probability("credible level", level)?;
        equal_tailed(&self.distribution()?, level)
    }

    /// The posterior as a distribution.
    pub fn distribution(&self) -> Result<Beta> {
        Beta::new(self.alpha, self.beta)
    }
}

fn equal_tailed(dist: &Beta, level: f64) -> Result<(f64, f64)> {
    let tail = (1.0 - level) / 2.0;
    Ok((
        dist.quantile_with(tail, INTERVAL_MAX_ITER, INTERVAL_TOL)?,
        dist.quantile_with(1.0 - tail, INTERVAL_MAX_ITER, INTERVAL_TOL)?,
    ))
}

/// Conjugate update of a Beta prior with binomial counts.
///
/// α' = α + successes, β' = β + failures. The credible interval is found by
/// bisection on the Beta CDF and carries 95% mass.
///
/// # Examples
///
/// ```
/// use u_inference::bayes::{update_beta_prior, BetaPrior};
///
/// let post = update_beta_prior(&BetaPrior::uniform(), 7, 3).unwrap();
/// assert_eq!(post.mean, 8.0 / 12.0);
/// let (lo, hi) = post.credible_interval;
/// assert!(lo < post.mean && post.mean < hi);
/// ```
pub fn update_beta_prior(prior: &BetaPrior, successes: u64, failures: u64) -> Result<BetaPosterior> {
    BetaPrior::new(prior.alpha, prior.beta)?;
    BetaPosterior::from_shapes(
        prior.alpha + successes as f64,
        prior.beta + failures as f64,
        DEFAULT_LEVEL,
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn posterior_mean_inside_interval(s in 0_u64..500, f in 0_u64..500) {
            let post = update_beta_prior(&BetaPrior::uniform(), s, f).expect("valid prior");
            let (lo, hi) = post.credible_interval;
            prop_assert!(0.0 <= lo && lo < hi && hi <= 1.0);
            prop_assert!(lo <= post.mean && post.mean <= hi);
        }
    }
}
