//! Monte Carlo A/B comparison of two conversion rates.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conjugate::{BetaPosterior, BetaPrior};
use super::sampling::beta_unchecked;
use crate::config::MonteCarloConfig;
use crate::error::{InferenceError, Result};

/// Observed outcomes for one arm of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    /// Number of conversions.
    pub successes: u64,
    /// Number of trials (≥ successes).
    pub total: u64,
}

impl ArmCounts {
    /// Creates counts, rejecting `successes > total`.
    pub fn new(successes: u64, total: u64) -> Result<Self> {
        let counts = Self { successes, total };
        counts.validate()?;
        Ok(counts)
    }

    fn validate(&self) -> Result<()> {
        if self.successes > self.total {
            return Err(InferenceError::InvalidInput(format!(
                "successes ({}) exceed total trials ({})",
                self.successes, self.total
            )));
        }
        Ok(())
    }

    /// Trials without a conversion.
    pub fn failures(&self) -> u64 {
        self.total - self.successes
    }
}

/// Result of a Bayesian A/B comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbTestResult {
    /// Posterior for the control rate.
    pub control: BetaPosterior,
    /// Posterior for the treatment rate.
    pub treatment: BetaPosterior,
    /// Share of draws where the treatment rate exceeds the control rate.
    pub probability_treatment_better: f64,
    /// Mean relative lift (p_T − p_C) / p_C over the draws.
    pub expected_lift: f64,
    /// Equal-tailed interval of the relative lift at the configured level.
    pub lift_credible_interval: (f64, f64),
    /// Mean of max(p_C − p_T, 0): expected loss from shipping the treatment.
    pub expected_loss_treatment: f64,
    /// Number of paired draws.
    pub draws: usize,
}

/// Bayesian A/B comparison by Monte Carlo.
///
/// Both arms get the same prior and are updated with their counts. Each of
/// `cfg.draws` iterations samples one rate per arm (gamma-ratio Beta
/// variates) and records whether the treatment wins and its relative lift.
/// Draws are sequential, so a given generator state always produces the
/// same result.
///
/// # Errors
///
/// `InvalidInput` when an arm reports more successes than trials,
/// `InvalidParameter` for an invalid prior or configuration.
pub fn ab_test<R: Rng + ?Sized>(
    control: ArmCounts,
    treatment: ArmCounts,
    prior: &BetaPrior,
    cfg: &MonteCarloConfig,
    rng: &mut R,
) -> Result<AbTestResult> {
    cfg.validate()?;
    control.validate()?;
    treatment.validate()?;
    let prior = BetaPrior::new(prior.alpha, prior.beta)?;

    let control_post = BetaPosterior::from_shapes(
        prior.alpha + control.successes as f64,
        prior.beta + control.failures() as f64,
        cfg.credible_level,
    )?;
    let treatment_post = BetaPosterior::from_shapes(
        prior.alpha + treatment.successes as f64,
        prior.beta + treatment.failures() as f64,
        cfg.credible_level,
    )?;

    let mut wins = 0_usize;
    let mut loss_sum = 0.0;
    let mut lifts = Vec::with_capacity(cfg.draws);
    for _ in 0..cfg.draws {
        let pc = beta_unchecked(control_post.alpha, control_post.beta, rng);
        let pt = beta_unchecked(treatment_post.alpha, treatment_post.beta, rng);
        if pt > pc {
            wins += 1;
        }
        loss_sum += (pc - pt).max(0.0);
        // pc is positive with probability one; skip the measure-zero case
        if pc > 0.0 {
            lifts.push((pt - pc) / pc);
        }
    }

    let n = cfg.draws as f64;
    let (expected_lift, lift_credible_interval) = if lifts.is_empty() {
        (f64::NAN, (f64::NAN, f64::NAN))
    } else {
        let mean = lifts.iter().sum::<f64>() / lifts.len() as f64;
        lifts.sort_by(|a, b| a.total_cmp(b));
        let tail = (1.0 - cfg.credible_level) / 2.0;
        let last = lifts.len() - 1;
        let lo_idx = ((lifts.len() as f64) * tail).floor() as usize;
        let hi_idx = ((lifts.len() as f64) * (1.0 - tail)).ceil() as usize;
        (mean, (lifts[lo_idx.min(last)], lifts[hi_idx.min(last)]))
    };

    let probability_treatment_better = wins as f64 / n;
    debug!(
        draws = cfg.draws,
        probability_treatment_better, expected_lift, "A/B comparison finished"
    );

    Ok(AbTestResult {
        control: control_post,
        treatment: treatment_post,
        probability_treatment_better,
        expected_lift,
        lift_credible_interval,
        expected_loss_treatment: loss_sum / n,
        draws: cfg.draws,
    })
}

/// [`ab_test`] with a `Xoshiro256PlusPlus` generator seeded from
/// `cfg.seed`. Two calls with the same seed return identical results.
///
/// # Errors
///
/// `InvalidParameter` when `cfg.seed` is `None`, plus the [`ab_test`]
/// failure modes.
///
/// # Examples
///
/// ```
/// use u_inference::bayes::{ab_test_seeded, ArmCounts, BetaPrior};
/// use u_inference::config::MonteCarloConfig;
///
/// let cfg = MonteCarloConfig { seed: Some(42), draws: 2_000, ..Default::default() };
/// let control = ArmCounts::new(40, 100).unwrap();
/// let treatment = ArmCounts::new(60, 100).unwrap();
/// let r = ab_test_seeded(control, treatment, &BetaPrior::uniform(), &cfg).unwrap();
/// assert!(r.probability_treatment_better > 0.95);
/// ```
pub fn ab_test_seeded(
    control: ArmCounts,
    treatment: ArmCounts,
    prior: &BetaPrior,
    cfg: &MonteCarloConfig,
) -> Result<AbTestResult> {
    let seed = cfg.seed.ok_or_else(|| {
        InferenceError::InvalidParameter("seeded A/B comparison requires a seed".into())
    })?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    ab_test(control, treatment, prior, cfg, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn seeded(seed: u64) -> MonteCarloConfig {
        MonteCarloConfig {
            seed: Some(seed),
            ..MonteCarloConfig::default()
        }
    }

    #[test]
    fn test_identical_arms_are_a_coin_flip() {
        let arm = ArmCounts::new(50, 100).expect("counts");
        let r = ab_test_seeded(arm, arm, &BetaPrior::uniform(), &seeded(5)).expect("should compute");
        assert_abs_diff_eq!(r.probability_treatment_better, 0.5, epsilon = 0.03);
        assert_abs_diff_eq!(r.expected_lift, 0.0, epsilon = 0.03);
        assert_eq!(r.control, r.treatment);
    }

    #[test]
    fn test_same_seed_reproduces_result() {
        let c = ArmCounts::new(30, 200).expect("counts");
        let t = ArmCounts::new(45, 210).expect("counts");
        let a = ab_test_seeded(c, t, &BetaPrior::uniform(), &seeded(17)).expect("should compute");
        let b = ab_test_seeded(c, t, &BetaPrior::uniform(), &seeded(17)).expect("should compute");
        assert_eq!(a, b);
    }

    #[test]
    fn test_lift_interval_brackets_expected_lift() {
        let c = ArmCounts::new(100, 1000).expect("counts");
        let t = ArmCounts::new(130, 1000).expect("counts");
        let r = ab_test_seeded(c, t, &BetaPrior::uniform(), &seeded(1)).expect("should compute");
        let (lo, hi) = r.lift_credible_interval;
        assert!(lo < r.expected_lift && r.expected_lift < hi);
        // 131/1002 vs 101/1002 ≈ 30% lift
        assert_abs_diff_eq!(r.expected_lift, 0.30, epsilon = 0.05);
        assert!(r.expected_loss_treatment < 0.002);
    }

    #[test]
    fn test_missing_seed_and_bad_counts_are_rejected() {
        let arm = ArmCounts { successes: 1, total: 2 };
        assert!(matches!(
            ab_test_seeded(arm, arm, &BetaPrior::uniform(), &MonteCarloConfig::default()),
            Err(InferenceError::InvalidParameter(_))
        ));
        assert!(ArmCounts::new(5, 4).is_err());
        let bogus = ArmCounts { successes: 5, total: 4 };
        assert!(matches!(
            ab_test_seeded(bogus, arm, &BetaPrior::uniform(), &seeded(0)),
            Err(InferenceError::InvalidInput(_))
        ));
    }
}
