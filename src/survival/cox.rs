//! Cox proportional-hazards regression.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{time_order, validate_records, SurvivalRecord};
use crate::config::{Convergence, SolverConfig};
use crate::distribution::Normal;
use crate::error::{ensure_len, InferenceError, Result};
use crate::matrix::Matrix;

/// Smallest Newton step fraction tried by step-halving.
const MIN_STEP: f64 = 1e-4;

/// Fitted Cox proportional-hazards model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoxModel {
    /// Regression coefficients β.
    pub coefficients: Vec<f64>,
    /// Hazard ratios exp(β).
    pub hazard_ratios: Vec<f64>,
    /// Standard errors from the inverse information matrix; infinite when
    /// the final information is singular.
    pub standard_errors: Vec<f64>,
    /// Wald statistics β / SE.
    pub z_scores: Vec<f64>,
    /// Two-sided Wald p-values.
    pub p_values: Vec<f64>,
    /// 95% intervals for the hazard ratios, exp(β ± z·SE).
    pub hazard_ratio_ci: Vec<(f64, f64)>,
    /// Log partial likelihood at the final coefficients.
    pub log_likelihood: f64,
    /// Log partial likelihood at β = 0.
    pub null_log_likelihood: f64,
    /// Harrell's C for the fitted risk scores; `None` without comparable pairs.
    pub concordance_index: Option<f64>,
    /// Solver outcome. A capped fit still carries its last iterate.
    pub convergence: Convergence,
    /// Number of records.
    pub n_observations: usize,
    /// Number of events.
    pub n_events: usize,
}

/// Partial likelihood pieces at one β.
struct PartialLikelihood {
    log_likelihood: f64,
    score: Vec<f64>,
    information: Matrix,
}

/// Covariates as a row-major n × p matrix plus time-sorted bookkeeping.
struct CoxData<'a> {
    records: &'a [SurvivalRecord],
    x: Matrix,
    order: Vec<usize>,
    /// (time, subjects with an event at that time), ascending.
    event_groups: Vec<(f64, Vec<usize>)>,
}

impl<'a> CoxData<'a> {
    fn new(records: &'a [SurvivalRecord]) -> Result<Self> {
        let p = match &records[0].covariates {
            Some(c) => c.len(),
            None => return Err(missing_covariates(0)),
        };
        ensure_len("Cox covariates", p, 1)?;

        let mut rows = Vec::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            let cov = r.covariates.as_ref().ok_or_else(|| missing_covariates(i))?;
            if cov.len() != p {
                return Err(InferenceError::DimensionMismatch {
                    what: "record covariates",
                    expected: p,
                    actual: cov.len(),
                });
            }
            if cov.iter().any(|v| !v.is_finite()) {
                return Err(InferenceError::InvalidInput(format!(
                    "record {i} has a non-finite covariate"
                )));
            }
            rows.push(cov.clone());
        }
        let x = Matrix::from_rows(&rows)?;

        let order = time_order(records);
        let mut event_groups: Vec<(f64, Vec<usize>)> = Vec::new();
        let mut i = 0;
        while i < order.len() {
            let t = records[order[i]].time;
            let mut events = Vec::new();
            while i < order.len() && records[order[i]].time == t {
                if records[order[i]].event {
                    events.push(order[i]);
                }
                i += 1;
            }
            if !events.is_empty() {
                event_groups.push((t, events));
            }
        }

        Ok(Self {
            records,
            x,
            order,
            event_groups,
        })
    }

    fn p(&self) -> usize {
        self.x.cols()
    }

    fn linear_predictor(&self, subject: usize, beta: &[f64]) -> f64 {
        self.x.row(subject).iter().zip(beta).map(|(x, b)| x * b).sum()
    }

    /// Breslow partial log-likelihood, score, and information at `beta`.
    ///
    /// Event times are visited in descending order so the risk set
    /// {j : tⱼ ≥ t} only ever grows.
    fn evaluate(&self, beta: &[f64]) -> PartialLikelihood {
        let p = self.p();
        let n = self.order.len();
        let mut score = vec![0.0; p];
        let mut information = Matrix::zeros(p, p);
        let mut ll = 0.0;

        let mut s0 = 0.0;
        let mut s1 = vec![0.0; p];
        let mut s2 = Matrix::zeros(p, p);
        let mut next = n;

        for (t, events) in self.event_groups.iter().rev() {
            while next > 0 && self.records[self.order[next - 1]].time >= *t {
                next -= 1;
                let subj = self.order[next];
                let xs = self.x.row(subj);
                let w = self.linear_predictor(subj, beta).exp();
                s0 += w;
                for j in 0..p {
                    s1[j] += xs[j] * w;
                    for k in 0..p {
                        s2[(j, k)] += xs[j] * xs[k] * w;
                    }
                }
            }

            let d = events.len() as f64;
            for &subj in events {
                ll += self.linear_predictor(subj, beta);
                for (s, x) in score.iter_mut().zip(self.x.row(subj)) {
                    *s += x;
                }
            }
            ll -= d * s0.ln();
            for j in 0..p {
                score[j] -= d * s1[j] / s0;
                for k in 0..p {
                    information[(j, k)] += d * (s2[(j, k)] / s0 - s1[j] * s1[k] / (s0 * s0));
                }
            }
        }

        PartialLikelihood {
            log_likelihood: ll,
            score,
            information,
        }
    }
}

/// Halves the Newton step from 1 until the likelihood does not drop below
/// `baseline`. `None` once the step factor falls under [`MIN_STEP`].
fn halving_search<F>(
    beta: &[f64],
    delta: &[f64],
    baseline: f64,
    evaluate: F,
) -> Option<(Vec<f64>, PartialLikelihood, f64)>
where
    F: Fn(&[f64]) -> PartialLikelihood,
{
    let mut step = 1.0;
    while step >= MIN_STEP {
        let candidate: Vec<f64> = beta.iter().zip(delta).map(|(b, d)| b + step * d).collect();
        let next = evaluate(&candidate);
        if next.log_likelihood.is_finite() && next.log_likelihood >= baseline - 1e-10 {
            return Some((candidate, next, step));
        }
        step *= 0.5;
    }
    None
}

fn missing_covariates(index: usize) -> InferenceError {
    InferenceError::InvalidInput(format!("record {index} has no covariates"))
}

/// Fits a Cox proportional-hazards model.
///
/// # Algorithm
///
/// Newton-Raphson on the Breslow partial log-likelihood starting from β = 0:
/// solve I(β)·Δ = U(β) and step β ← β + Δ, halving the step while the
/// likelihood decreases. Iteration stops when max |Δ| < `cfg.tolerance`.
///
/// The last accepted iterate is returned with
/// `convergence.converged == false` when the fit hits
/// `cfg.max_iterations`, when step-halving finds no improvement, or when
/// the information matrix turns singular after the first step. The last
/// case is a monotone likelihood, e.g. a covariate that separates events
/// from survivors; its standard errors are then infinite and its p-values 1.
///
/// # Errors
///
/// - `InvalidInput` if any record lacks covariates
/// - `DimensionMismatch` if covariate lengths differ
/// - `InsufficientData` for fewer than 2 records or no events
/// - `SingularMatrix` if the information matrix at β = 0 cannot be
///   inverted (collinear or constant covariates)
///
/// # Examples
///
/// ```
/// use u_inference::config::SolverConfig;
/// use u_inference::survival::{cox_proportional_hazards, SurvivalRecord};
///
/// let records: Vec<_> = [
///     (2.0, true, 1.0), (3.0, true, 1.0), (3.0, false, 0.0), (5.0, true, 1.0),
///     (6.0, true, 0.0), (7.0, false, 1.0), (9.0, true, 0.0), (10.0, true, 0.0),
///     (11.0, false, 1.0), (12.0, true, 0.0),
/// ]
/// .iter()
/// .map(|&(t, e, x)| SurvivalRecord::with_covariates(t, e, vec![x]))
/// .collect();
/// let model = cox_proportional_hazards(&records, &SolverConfig::default()).unwrap();
/// assert!(model.convergence.converged);
/// assert!(model.hazard_ratios[0] > 1.0);
/// ```
pub fn cox_proportional_hazards(records: &[SurvivalRecord], cfg: &SolverConfig) -> Result<CoxModel> {
    cfg.validate()?;
    validate_records("Cox records", records)?;
    ensure_len("Cox records", records.len(), 2)?;
    let data = CoxData::new(records)?;
    let n_events = records.iter().filter(|r| r.event).count();
    ensure_len("Cox events", n_events, 1)?;

    let p = data.p();
    debug!(n = records.len(), p, n_events, "fitting Cox model");

    let mut beta = vec![0.0; p];
    let mut current = data.evaluate(&beta);
    let null_log_likelihood = current.log_likelihood;
    let mut convergence = Convergence {
        converged: false,
        iterations: 0,
        max_change: f64::INFINITY,
    };

    for iter in 1..=cfg.max_iterations {
        let delta = match current.information.solve(&current.score) {
            Ok(delta) => delta,
            Err(InferenceError::SingularMatrix { column, pivot }) if iter > 1 => {
                warn!(iter, column, pivot, "Cox information became singular; keeping last iterate");
                break;
            }
            Err(err) => return Err(err),
        };

        let accepted = halving_search(&beta, &delta, current.log_likelihood, |b| data.evaluate(b));
        let Some((candidate, next, step)) = accepted else {
            warn!(iter, "Cox step-halving found no improvement; keeping last iterate");
            convergence.iterations = iter;
            break;
        };

        let max_change = beta
            .iter()
            .zip(&candidate)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        trace!(iter, step, max_change, log_likelihood = next.log_likelihood, "Cox step");

        beta = candidate;
        current = next;
        convergence.iterations = iter;
        convergence.max_change = max_change;
        if max_change < cfg.tolerance {
            convergence.converged = true;
            break;
        }
    }

    if convergence.converged {
        debug!(iterations = convergence.iterations, "Cox model converged");
    } else {
        warn!(
            iterations = convergence.iterations,
            max_change = convergence.max_change,
            "Cox model did not converge; returning last iterate"
        );
    }

    // Past the first step a singular information means a monotone likelihood.
    let covariance = match current.information.inverse() {
        Ok(c) => Some(c),
        Err(InferenceError::SingularMatrix { column, pivot }) if convergence.iterations > 0 => {
            warn!(column, pivot, "Cox information is singular at the final iterate");
            None
        }
        Err(err) => return Err(err),
    };
    let normal = Normal::standard();
    let z_crit = normal.quantile(0.975)?;

    let mut standard_errors = Vec::with_capacity(p);
    let mut z_scores = Vec::with_capacity(p);
    let mut p_values = Vec::with_capacity(p);
    let mut hazard_ratio_ci = Vec::with_capacity(p);
    for (j, &b) in beta.iter().enumerate() {
        let se = covariance
            .as_ref()
            .map_or(f64::INFINITY, |c| c[(j, j)].max(0.0).sqrt());
        let z = b / se;
        standard_errors.push(se);
        z_scores.push(z);
        p_values.push(2.0 * normal.sf(z.abs()));
        hazard_ratio_ci.push(((b - z_crit * se).exp(), (b + z_crit * se).exp()));
    }

    let risk_scores: Vec<f64> = (0..records.len())
        .map(|i| data.linear_predictor(i, &beta))
        .collect();
    let c_index = concordance_index(records, &risk_scores)?;

    Ok(CoxModel {
        hazard_ratios: beta.iter().map(|b| b.exp()).collect(),
        coefficients: beta,
        standard_errors,
        z_scores,
        p_values,
        hazard_ratio_ci,
        log_likelihood: current.log_likelihood,
        null_log_likelihood,
        concordance_index: c_index,
        convergence,
        n_observations: records.len(),
        n_events,
    })
}

/// Harrell's concordance index.
///
/// A pair (i, j) is comparable when tᵢ < tⱼ and subject i had the event. It
/// is concordant when i has the higher risk score; tied scores count ½.
/// Exhaustive O(n²) comparison. Returns `None` when no pair is comparable.
///
/// # Errors
///
/// `DimensionMismatch` when `risk_scores` and `records` differ in length.
pub fn concordance_index(records: &[SurvivalRecord], risk_scores: &[f64]) -> Result<Option<f64>> {
    if records.len() != risk_scores.len() {
        return Err(InferenceError::DimensionMismatch {
            what: "risk scores",
            expected: records.len(),
            actual: risk_scores.len(),
        });
    }

    let mut concordant = 0.0;
    let mut comparable = 0_usize;
    for (i, ri) in records.iter().enumerate() {
        if !ri.event {
            continue;
        }
        for (j, rj) in records.iter().enumerate() {
            if ri.time < rj.time {
                comparable += 1;
                if risk_scores[i] > risk_scores[j] {
                    concordant += 1.0;
                } else if risk_scores[i] == risk_scores[j] {
                    concordant += 0.5;
                }
            }
        }
    }

    Ok((comparable > 0).then(|| concordant / comparable as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn single_covariate() -> Vec<SurvivalRecord> {
        [
            (2.0, true, 1.0),
            (3.0, true, 1.0),
            (3.0, false, 0.0),
            (5.0, true, 1.0),
            (6.0, true, 0.0),
            (7.0, false, 1.0),
            (9.0, true, 0.0),
            (10.0, true, 0.0),
            (11.0, false, 1.0),
            (12.0, true, 0.0),
        ]
        .iter()
        .map(|&(t, e, x)| SurvivalRecord::with_covariates(t, e, vec![x]))
        .collect()
    }

    #[test]
    fn test_breslow_reference_fit() {
        let model = cox_proportional_hazards(&single_covariate(), &SolverConfig::default())
            .expect("should fit");
        assert!(model.convergence.converged);
        assert_abs_diff_eq!(model.coefficients[0], 0.498_276_218_472_461_5, epsilon = 1e-6);
        assert_abs_diff_eq!(model.standard_errors[0], 0.829_961_521_146_410_7, epsilon = 1e-6);
        assert_abs_diff_eq!(model.log_likelihood, -10.543_794_521_187_225, epsilon = 1e-9);
        assert_abs_diff_eq!(model.null_log_likelihood, -10.722_385_938_401_634, epsilon = 1e-9);
        assert_abs_diff_eq!(model.hazard_ratios[0], model.coefficients[0].exp(), epsilon = 1e-15);
        let (lo, hi) = model.hazard_ratio_ci[0];
        assert!(lo < model.hazard_ratios[0] && model.hazard_ratios[0] < hi);
        assert_eq!((model.n_observations, model.n_events), (10, 7));
    }

    #[test]
    fn test_concordance_of_fitted_model() {
        let model = cox_proportional_hazards(&single_covariate(), &SolverConfig::default())
            .expect("should fit");
        // 20.5 concordant of 32 comparable pairs
        assert_abs_diff_eq!(model.concordance_index.expect("pairs"), 0.640_625, epsilon = 1e-12);
    }

    #[test]
    fn test_concordance_extremes() {
        let records: Vec<_> = (1..=4).map(|t| SurvivalRecord::new(t as f64, true)).collect();
        let perfect = [4.0, 3.0, 2.0, 1.0];
        let reversed = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(concordance_index(&records, &perfect).unwrap(), Some(1.0));
        assert_eq!(concordance_index(&records, &reversed).unwrap(), Some(0.0));
        assert_eq!(concordance_index(&records, &[0.0; 4]).unwrap(), Some(0.5));
        let censored: Vec<_> = (1..=3).map(|t| SurvivalRecord::new(t as f64, false)).collect();
        assert_eq!(concordance_index(&censored, &[1.0, 2.0, 3.0]).unwrap(), None);
        assert!(concordance_index(&records, &[1.0]).is_err());
    }

    #[test]
    fn test_iteration_cap_returns_last_iterate() {
        let cfg = SolverConfig {
            max_iterations: 1,
            tolerance: 1e-12,
        };
        let model = cox_proportional_hazards(&single_covariate(), &cfg).expect("should fit");
        assert!(!model.convergence.converged);
        assert_eq!(model.convergence.iterations, 1);
        assert!(model.coefficients[0] > 0.0);
        assert!(model.log_likelihood > model.null_log_likelihood);
    }

    #[test]
    fn test_missing_or_ragged_covariates() {
        let mut records = single_covariate();
        records[3].covariates = None;
        assert!(matches!(
            cox_proportional_hazards(&records, &SolverConfig::default()),
            Err(InferenceError::InvalidInput(_))
        ));

        let mut records = single_covariate();
        records[4].covariates = Some(vec![1.0, 2.0]);
        assert!(matches!(
            cox_proportional_hazards(&records, &SolverConfig::default()),
            Err(InferenceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_constant_covariate_is_singular() {
        let records: Vec<_> = (1..=5)
            .map(|t| SurvivalRecord::with_covariates(t as f64, true, vec![1.0]))
            .collect();
        assert!(matches!(
            cox_proportional_hazards(&records, &SolverConfig::default()),
            Err(InferenceError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn test_cox_separating_covariate_returns_unconverged_fit() {
        // Every x₀ = 1 subject fails before any x₀ = 0 subject: β₀ → ∞.
        let records: Vec<_> = [
            (1.0, true, 1.0, 0.3),
            (2.0, true, 1.0, -0.5),
            (3.0, true, 1.0, 1.2),
            (4.0, true, 1.0, 0.1),
            (5.0, true, 1.0, -0.8),
            (6.0, true, 0.0, 0.6),
            (7.0, false, 0.0, -0.2),
            (8.0, true, 0.0, 0.9),
            (9.0, true, 0.0, -1.1),
            (10.0, false, 0.0, 0.4),
        ]
        .iter()
        .map(|&(t, e, a, b)| SurvivalRecord::with_covariates(t, e, vec![a, b]))
        .collect();
        let model = cox_proportional_hazards(&records, &SolverConfig::default())
            .expect("monotone likelihood still yields a model");
        assert!(!model.convergence.converged);
        assert!(model.coefficients[0] > 3.0);
        assert!(model.standard_errors[0] > 10.0);
        assert!(model.p_values[0] > 0.5);
        assert!(model.p_values.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(model.log_likelihood > model.null_log_likelihood);
    }

    fn quadratic(b: &[f64]) -> PartialLikelihood {
        PartialLikelihood {
            log_likelihood: -(b[0] - 1.0).powi(2),
            score: vec![0.0],
            information: Matrix::zeros(1, 1),
        }
    }

    #[test]
    fn test_halving_search_halves_until_improvement() {
        // From 0 toward 4: step 1 lands at ll = -9, step ½ at ll = -1.
        let (candidate, next, step) =
            halving_search(&[0.0], &[4.0], -1.0, quadratic).expect("improves at half step");
        assert_eq!(step, 0.5);
        assert_abs_diff_eq!(candidate[0], 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(next.log_likelihood, -1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_halving_search_gives_up_below_min_step() {
        // Any move away from the optimum lowers the likelihood.
        assert!(halving_search(&[1.0], &[3.0], 0.0, quadratic).is_none());
    }

    #[test]
    fn test_two_covariates_fit_and_report_per_coefficient() {
        let records: Vec<_> = [
            (1.0, true, 1.0, 0.5),
            (2.0, true, 1.0, 1.5),
            (3.0, false, 0.0, 0.2),
            (4.0, true, 1.0, -0.3),
            (5.0, true, 0.0, 0.8),
            (6.0, true, 0.0, -1.0),
            (7.0, false, 1.0, 0.1),
            (8.0, true, 0.0, -0.4),
            (9.0, true, 0.0, 0.3),
            (10.0, false, 0.0, -0.7),
        ]
        .iter()
        .map(|&(t, e, a, b)| SurvivalRecord::with_covariates(t, e, vec![a, b]))
        .collect();
        let model = cox_proportional_hazards(&records, &SolverConfig::default()).expect("should fit");
        assert!(model.convergence.converged);
        assert_eq!(model.coefficients.len(), 2);
        assert!(model.p_values.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(model.log_likelihood >= model.null_log_likelihood);
    }
}
