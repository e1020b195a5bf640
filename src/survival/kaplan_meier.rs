//! Kaplan-Meier product-limit estimator.

use serde::{Deserialize, Serialize};

use super::{time_order, validate_records, SurvivalRecord};
use crate::distribution::Normal;
use crate::error::{ensure_probability, Result};

/// Kaplan-Meier survival curve.
///
/// One entry per distinct observed time (events and censorings), so the
/// step function can be read off directly: it drops only at times with
/// events and stays flat at censoring-only times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaplanMeierResult {
    /// Distinct observed times, ascending.
    pub times: Vec<f64>,
    /// S(t) just after each time; non-increasing, in [0, 1].
    pub survival: Vec<f64>,
    /// Events at each time.
    pub events_at_time: Vec<usize>,
    /// Censorings at each time.
    pub censored_at_time: Vec<usize>,
    /// Subjects at risk just before each time.
    pub at_risk_at_time: Vec<usize>,
    /// Greenwood standard error of S(t).
    pub std_errors: Vec<f64>,
    /// Log-log confidence interval for S(t).
    pub confidence_intervals: Vec<(f64, f64)>,
    /// Coverage of `confidence_intervals`.
    pub confidence_level: f64,
    /// First time with S(t) ≤ 0.5; `None` if the curve never gets there.
    pub median_survival: Option<f64>,
    /// Number of records.
    pub n_total: usize,
    /// Number of events.
    pub n_events: usize,
}

impl KaplanMeierResult {
    /// Evaluates the step function: 1 before the first time, otherwise the
    /// survival at the last time ≤ `t`.
    pub fn survival_at(&self, t: f64) -> f64 {
        let idx = self.times.partition_point(|&x| x <= t);
        if idx == 0 {
            1.0
        } else {
            self.survival[idx - 1]
        }
    }
}

/// Kaplan-Meier estimate with 95% confidence intervals.
///
/// # Algorithm
///
/// Records are sorted by time. At each distinct time with nᵢ at risk and
/// dᵢ events, S ← S · (nᵢ − dᵢ)/nᵢ. Greenwood's variance is
/// Var(S) = S² Σ dⱼ / (nⱼ(nⱼ − dⱼ)); the interval is built on
/// θ = log(−log S) with SE(θ) = √(Σ dⱼ/(nⱼ(nⱼ−dⱼ))) / |log S| and mapped
/// back, which keeps both bounds inside [0, 1].
///
/// # Examples
///
/// ```
/// use u_inference::survival::{kaplan_meier, SurvivalRecord};
///
/// let records = [
///     SurvivalRecord::new(5.0, true),
///     SurvivalRecord::new(8.0, false),
///     SurvivalRecord::new(12.0, true),
///     SurvivalRecord::new(12.0, true),
///     SurvivalRecord::new(20.0, false),
/// ];
/// let km = kaplan_meier(&records).unwrap();
/// assert_eq!(km.times, vec![5.0, 8.0, 12.0, 20.0]);
/// assert_eq!(km.at_risk_at_time, vec![5, 4, 3, 1]);
/// assert_eq!(km.median_survival, Some(12.0));
/// ```
pub fn kaplan_meier(records: &[SurvivalRecord]) -> Result<KaplanMeierResult> {
    kaplan_meier_with_level(records, 0.95)
}

/// [`kaplan_meier`] with a caller-chosen interval coverage.
pub fn kaplan_meier_with_level(
    records: &[SurvivalRecord],
    confidence_level: f64,
) -> Result<KaplanMeierResult> {
    validate_records("Kaplan-Meier records", records)?;
    ensure_probability("confidence_level", confidence_level)?;
    let z = Normal::standard().quantile(0.5 + confidence_level / 2.0)?;

    let order = time_order(records);
    let n = records.len();

    let mut result = KaplanMeierResult {
        times: Vec::new(),
        survival: Vec::new(),
        events_at_time: Vec::new(),
        censored_at_time: Vec::new(),
        at_risk_at_time: Vec::new(),
        std_errors: Vec::new(),
        confidence_intervals: Vec::new(),
        confidence_level,
        median_survival: None,
        n_total: n,
        n_events: records.iter().filter(|r| r.event).count(),
    };

    let mut at_risk = n;
    let mut survival = 1.0;
    let mut greenwood_sum = 0.0;

    let mut i = 0;
    while i < n {
        let t = records[order[i]].time;
        let mut events = 0;
        let mut censored = 0;
        while i < n && records[order[i]].time == t {
            if records[order[i]].event {
                events += 1;
            } else {
                censored += 1;
            }
            i += 1;
        }

        if events > 0 {
            let (ni, di) = (at_risk as f64, events as f64);
            survival *= (ni - di) / ni;
            if at_risk > events {
                greenwood_sum += di / (ni * (ni - di));
            }
        }

        let ci = if survival <= 0.0 {
            (0.0, 0.0)
        } else if survival >= 1.0 || greenwood_sum == 0.0 {
            (survival, survival)
        } else {
            let log_s = survival.ln();
            let theta = (-log_s).ln();
            let se_theta = greenwood_sum.sqrt() / log_s.abs();
            // exp(−exp(·)) is decreasing, so the bounds swap
            let lo = (-(theta + z * se_theta).exp()).exp();
            let hi = (-(theta - z * se_theta).exp()).exp();
            (lo, hi)
        };

        if result.median_survival.is_none() && survival <= 0.5 {
            result.median_survival = Some(t);
        }

        result.times.push(t);
        result.survival.push(survival);
        result.events_at_time.push(events);
        result.censored_at_time.push(censored);
        result.at_risk_at_time.push(at_risk);
        result.std_errors.push(survival * greenwood_sum.sqrt());
        result.confidence_intervals.push(ci);

        at_risk -= events + censored;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scenario() -> Vec<SurvivalRecord> {
        vec![
            SurvivalRecord::new(5.0, true),
            SurvivalRecord::new(8.0, false),
            SurvivalRecord::new(12.0, true),
            SurvivalRecord::new(12.0, true),
            SurvivalRecord::new(20.0, false),
        ]
    }

    #[test]
    fn test_steps_drop_only_at_events() {
        let km = kaplan_meier(&scenario()).expect("should compute");
        assert_abs_diff_eq!(km.survival[0], 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(km.survival[1], 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(km.survival[2], 0.8 / 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(km.survival[3], 0.8 / 3.0, epsilon = 1e-15);
        assert_eq!(km.events_at_time, vec![1, 0, 2, 0]);
        assert_eq!(km.censored_at_time, vec![0, 1, 0, 1]);
        assert_eq!((km.n_total, km.n_events), (5, 3));
    }

    #[test]
    fn test_greenwood_standard_errors() {
        let km = kaplan_meier(&scenario()).expect("should compute");
        // Σ d/(n(n−d)): 1/(5·4) then + 2/(3·1)
        assert_abs_diff_eq!(km.std_errors[0], 0.8 * (1.0_f64 / 20.0).sqrt(), epsilon = 1e-12);
        let gw = 1.0 / 20.0 + 2.0 / 3.0;
        assert_abs_diff_eq!(km.std_errors[2], (0.8 / 3.0) * f64::sqrt(gw), epsilon = 1e-12);
        for (&(lo, hi), &s) in km.confidence_intervals.iter().zip(&km.survival) {
            assert!(0.0 <= lo && lo <= s && s <= hi && hi <= 1.0);
        }
    }

    #[test]
    fn test_log_log_interval_reference() {
        let km = kaplan_meier(&scenario()).expect("should compute");
        // θ = ln(−ln 0.8), se = √(1/20)/|ln 0.8|
        let theta = (-(0.8_f64).ln()).ln();
        let se = (0.05_f64).sqrt() / (0.8_f64).ln().abs();
        let z = 1.959_963_984_540_054;
        let (lo, hi) = km.confidence_intervals[0];
        assert_abs_diff_eq!(lo, (-(theta + z * se).exp()).exp(), epsilon = 1e-8);
        assert_abs_diff_eq!(hi, (-(theta - z * se).exp()).exp(), epsilon = 1e-8);
    }

    #[test]
    fn test_survival_at_reads_the_step_function() {
        let km = kaplan_meier(&scenario()).expect("should compute");
        assert_eq!(km.survival_at(0.0), 1.0);
        assert_eq!(km.survival_at(4.999), 1.0);
        assert_abs_diff_eq!(km.survival_at(5.0), 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(km.survival_at(11.0), 0.8, epsilon = 1e-15);
        assert_abs_diff_eq!(km.survival_at(100.0), 0.8 / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn test_all_censored_never_drops() {
        let records: Vec<_> = (1..=4).map(|t| SurvivalRecord::new(t as f64, false)).collect();
        let km = kaplan_meier(&records).expect("should compute");
        assert!(km.survival.iter().all(|&s| s == 1.0));
        assert_eq!(km.median_survival, None);
    }

    #[test]
    fn test_last_subject_failing_reaches_zero() {
        let records = [SurvivalRecord::new(1.0, true), SurvivalRecord::new(2.0, true)];
        let km = kaplan_meier(&records).expect("should compute");
        assert_eq!(km.survival, vec![0.5, 0.0]);
        assert_eq!(km.confidence_intervals[1], (0.0, 0.0));
        assert_eq!(km.median_survival, Some(1.0));
    }

    #[test]
    fn test_wider_level_gives_wider_interval() {
        let km90 = kaplan_meier_with_level(&scenario(), 0.90).expect("should compute");
        let km99 = kaplan_meier_with_level(&scenario(), 0.99).expect("should compute");
        let w = |(lo, hi): (f64, f64)| hi - lo;
        assert!(w(km99.confidence_intervals[2]) > w(km90.confidence_intervals[2]));
        assert!(kaplan_meier_with_level(&scenario(), 1.0).is_err());
    }
}
