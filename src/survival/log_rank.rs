//! Two-group log-rank test.

use serde::{Deserialize, Serialize};

use super::{time_order, validate_records, SurvivalRecord};
use crate::config::TestConfig;
use crate::distribution::ChiSquared;
use crate::error::{InferenceError, Result};

/// Result of the log-rank test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRankResult {
    /// (O₁ − E₁)² / V, approximately χ²(1) under H₀.
    pub statistic: f64,
    /// Always 1 for two groups.
    pub df: f64,
    /// Upper-tail χ²(1) probability of `statistic`.
    pub p_value: f64,
    /// `p_value < alpha`.
    pub reject: bool,
    /// Observed events in (group A, group B).
    pub observed: (f64, f64),
    /// Expected events under H₀ in (group A, group B).
    pub expected: (f64, f64),
    /// Hypergeometric variance of O₁ − E₁.
    pub variance: f64,
}

/// Log-rank test: H₀: both groups share one survival function.
///
/// # Algorithm
///
/// At each distinct event time with n at risk (n₁ in group A) and d events:
///
/// - E₁ += d · n₁/n
/// - V += d · (n₁/n)(1 − n₁/n)(n − d)/(n − 1)
///
/// The statistic (O₁ − E₁)²/V is compared with χ²(1). The test is
/// two-sided; `cfg.alternative` does not apply.
///
/// # Errors
///
/// `InsufficientData` if either group is empty or neither group has an
/// event, `ZeroVariance` when no event time has more than one subject at
/// risk.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::survival::{log_rank_test, SurvivalRecord};
///
/// let a: Vec<_> = [10.0, 12.0, 15.0, 18.0, 20.0].iter().map(|&t| SurvivalRecord::new(t, true)).collect();
/// let b: Vec<_> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|&t| SurvivalRecord::new(t, true)).collect();
/// let r = log_rank_test(&a, &b, &TestConfig::default()).unwrap();
/// assert!(r.reject);
/// ```
pub fn log_rank_test(
    group_a: &[SurvivalRecord],
    group_b: &[SurvivalRecord],
    cfg: &TestConfig,
) -> Result<LogRankResult> {
    cfg.validate()?;
    validate_records("log-rank group A", group_a)?;
    validate_records("log-rank group B", group_b)?;

    // Pool with a group flag: true = A.
    let pooled: Vec<SurvivalRecord> = group_a.iter().chain(group_b).cloned().collect();
    let in_a = |idx: usize| idx < group_a.len();
    let order = time_order(&pooled);

    let total_events = pooled.iter().filter(|r| r.event).count();
    if total_events == 0 {
        return Err(InferenceError::InsufficientData {
            what: "log-rank events",
            required: 1,
            actual: 0,
        });
    }

    let mut risk_a = group_a.len();
    let mut risk_b = group_b.len();
    let (mut obs_a, mut obs_b) = (0.0, 0.0);
    let (mut exp_a, mut exp_b) = (0.0, 0.0);
    let mut variance = 0.0;

    let n = pooled.len();
    let mut i = 0;
    while i < n {
        let t = pooled[order[i]].time;
        let (mut d_a, mut d_b, mut left_a, mut left_b) = (0_usize, 0_usize, 0_usize, 0_usize);
        while i < n && pooled[order[i]].time == t {
            let idx = order[i];
            match (in_a(idx), pooled[idx].event) {
                (true, true) => d_a += 1,
                (false, true) => d_b += 1,
                _ => {}
            }
            if in_a(idx) {
                left_a += 1;
            } else {
                left_b += 1;
            }
            i += 1;
        }

        let d = (d_a + d_b) as f64;
        let at_risk = (risk_a + risk_b) as f64;
        if d > 0.0 {
            let share = risk_a as f64 / at_risk;
            obs_a += d_a as f64;
            obs_b += d_b as f64;
            exp_a += d * share;
            exp_b += d * (1.0 - share);
            if at_risk > 1.0 {
                variance += d * share * (1.0 - share) * (at_risk - d) / (at_risk - 1.0);
            }
        }

        risk_a -= left_a;
        risk_b -= left_b;
    }

    if variance <= 0.0 {
        return Err(InferenceError::ZeroVariance("log-rank test"));
    }

    let statistic = (obs_a - exp_a).powi(2) / variance;
    let p_value = ChiSquared::new(1.0)?.sf(statistic);

    Ok(LogRankResult {
        statistic,
        df: 1.0,
        p_value,
        reject: p_value < cfg.alpha,
        observed: (obs_a, obs_b),
        expected: (exp_a, exp_b),
        variance,
    })
}
