//! Weibull maximum likelihood for right-censored lifetimes.
//!
//! # Algorithm
//!
//! With r events, the shape β solves the profile score equation
//!
//! ```text
//! g(β) = r/β + Σ_events ln(tᵢ) − r · Σ tᵢ^β ln(tᵢ) / Σ tᵢ^β = 0
//! ```
//!
//! where the last two sums run over all records (events and censorings).
//! Newton-Raphson is applied to g using
//!
//! ```text
//! g'(β) = −r/β² − r · (S₂S₀ − S₁²) / S₀²
//! ```
//!
//! with Sₖ = Σ tᵢ^β (ln tᵢ)^k. The scale follows in closed form:
//! η = (S₀ / r)^(1/β).
//!
//! Times are divided by the largest time before the sums are formed; g is
//! invariant under that rescaling and tᵢ^β cannot overflow.
//!
//! # References
//!
//! - Lawless, J.F. (2003). *Statistical Models and Methods for Lifetime
//!   Data*, 2nd ed., Wiley, §5.2.
//! - Abernethy, R.B. (2006). *The New Weibull Handbook*, 5th ed.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{validate_records, SurvivalRecord};
use crate::config::{Convergence, SolverConfig};
use crate::error::{ensure_len, InferenceError, Result};
use crate::special::gamma;

/// Starting shape, slightly above the exponential case.
const INITIAL_SHAPE: f64 = 1.2;

/// Fitted two-parameter Weibull model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullModel {
    /// Shape parameter β.
    pub shape: f64,
    /// Scale parameter η.
    pub scale: f64,
    /// Log-likelihood at (β, η), censoring included.
    pub log_likelihood: f64,
    /// Records used in the fit.
    pub n_observations: usize,
    /// Events (failures) among them.
    pub n_events: usize,
    /// Solver outcome.
    pub convergence: Convergence,
}

impl WeibullModel {
    /// Reliability R(t) = exp(−(t/η)^β); 1 for t ≤ 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_inference::config::SolverConfig;
    /// use u_inference::survival::{weibull_mle, SurvivalRecord};
    ///
    /// let records: Vec<_> = [10.0, 20.0, 30.0, 40.0, 50.0]
    ///     .iter()
    ///     .map(|&t| SurvivalRecord::new(t, true))
    ///     .collect();
    /// let model = weibull_mle(&records, &SolverConfig::default()).unwrap();
    /// assert!((model.reliability(model.scale) - (-1.0_f64).exp()).abs() < 1e-12);
    /// ```
    pub fn reliability(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 1.0;
        }
        (-(t / self.scale).powf(self.shape)).exp()
    }

    /// Hazard rate h(t) = (β/η)(t/η)^(β−1); 0 for t ≤ 0.
    pub fn hazard(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        (self.shape / self.scale) * (t / self.scale).powf(self.shape - 1.0)
    }

    /// Mean life η·Γ(1 + 1/β).
    pub fn mean_life(&self) -> f64 {
        self.scale * gamma(1.0 + 1.0 / self.shape)
    }

    /// Time at which reliability falls to `p`: η(−ln p)^(1/β).
    pub fn time_to_reliability(&self, p: f64) -> Result<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "reliability level must be in (0, 1), got {p}"
            )));
        }
        Ok(self.scale * (-p.ln()).powf(1.0 / self.shape))
    }

    /// B-life: time by which `fraction_failed` of the population has
    /// failed. `b_life(0.10)` is the B10 life.
    pub fn b_life(&self, fraction_failed: f64) -> Result<f64> {
        if !(fraction_failed > 0.0 && fraction_failed < 1.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "failed fraction must be in (0, 1), got {fraction_failed}"
            )));
        }
        self.time_to_reliability(1.0 - fraction_failed)
    }
}

/// Weibull MLE from right-censored records.
///
/// # Errors
///
/// - `InsufficientData` for fewer than 2 events
/// - `InvalidInput` for a non-positive time, or when every time is equal
///   (the shape has no finite maximum)
///
/// Reaching `cfg.max_iterations` is not an error: the last iterate is
/// returned with `convergence.converged == false`.
pub fn weibull_mle(records: &[SurvivalRecord], cfg: &SolverConfig) -> Result<WeibullModel> {
    cfg.validate()?;
    validate_records("Weibull records", records)?;
    if let Some(i) = records.iter().position(|r| r.time <= 0.0) {
        return Err(InferenceError::InvalidInput(format!(
            "Weibull times must be positive; record {i} has {}",
            records[i].time
        )));
    }
    let n_events = records.iter().filter(|r| r.event).count();
    ensure_len("Weibull failures", n_events, 2)?;

    let t_max = records.iter().map(|r| r.time).fold(0.0, f64::max);
    let t_min = records.iter().map(|r| r.time).fold(f64::INFINITY, f64::min);
    if t_min == t_max {
        return Err(InferenceError::InvalidInput(
            "Weibull fit needs at least two distinct times".into(),
        ));
    }

    let ln_u: Vec<f64> = records.iter().map(|r| (r.time / t_max).ln()).collect();
    let sum_ln_u_events: f64 = records
        .iter()
        .zip(&ln_u)
        .filter(|(r, _)| r.event)
        .map(|(_, l)| l)
        .sum();
    let r = n_events as f64;

    let power_sums = |beta: f64| {
        let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);
        for &lu in &ln_u {
            let ub = (beta * lu).exp();
            s0 += ub;
            s1 += ub * lu;
            s2 += ub * lu * lu;
        }
        (s0, s1, s2)
    };

    debug!(n = records.len(), n_events, "fitting Weibull model");

    let mut beta = INITIAL_SHAPE;
    let mut convergence = Convergence {
        converged: false,
        iterations: 0,
        max_change: f64::INFINITY,
    };

    for iter in 1..=cfg.max_iterations {
        let (s0, s1, s2) = power_sums(beta);
        let g = r / beta + sum_ln_u_events - r * s1 / s0;
        let g_prime = -r / (beta * beta) - r * (s2 * s0 - s1 * s1) / (s0 * s0);
        if !g_prime.is_finite() || g_prime.abs() < 1e-30 {
            break;
        }

        let mut next = beta - g / g_prime;
        if next <= 0.0 {
            next = beta / 2.0;
        }
        let change = (next - beta).abs();
        trace!(iter, beta = next, change, "Weibull step");

        beta = next;
        convergence.iterations = iter;
        convergence.max_change = change;
        if change < cfg.tolerance {
            convergence.converged = true;
            break;
        }
    }

    if convergence.converged {
        debug!(iterations = convergence.iterations, shape = beta, "Weibull fit converged");
    } else {
        warn!(
            iterations = convergence.iterations,
            max_change = convergence.max_change,
            "Weibull fit did not converge; returning last iterate"
        );
    }

    let (s0, _, _) = power_sums(beta);
    let scale = t_max * (s0 / r).powf(1.0 / beta);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(InferenceError::InvalidInput(format!(
            "Weibull scale is not finite at shape {beta}"
        )));
    }

    let sum_ln_t_events: f64 = records.iter().filter(|r| r.event).map(|r| r.time.ln()).sum();
    let cumulative_hazard: f64 = records.iter().map(|rec| (rec.time / scale).powf(beta)).sum();
    let log_likelihood =
        r * beta.ln() - r * beta * scale.ln() + (beta - 1.0) * sum_ln_t_events - cumulative_hazard;

    Ok(WeibullModel {
        shape: beta,
        scale,
        log_likelihood,
        n_observations: records.len(),
        n_events,
        convergence,
    })
}
