//! Survival analysis.
//!
//! Time-to-event methods over right-censored observations.
//!
//! # Methods
//!
//! - [`kaplan_meier`]: product-limit survival curve with Greenwood standard
//!   errors and log-log confidence intervals
//! - [`log_rank_test`]: two-group comparison with hypergeometric variance
//! - [`cox_proportional_hazards`]: Newton-Raphson on the Breslow partial
//!   likelihood, with hazard ratios and a concordance index
//! - [`weibull_mle`]: censoring-aware Weibull maximum likelihood, with
//!   reliability functions on the fitted [`WeibullModel`]
//!
//! # References
//!
//! - Kaplan, E.L. & Meier, P. (1958). "Nonparametric estimation from
//!   incomplete observations", *JASA* 53(282), pp. 457-481.
//! - Cox, D.R. (1972). "Regression models and life-tables", *JRSS B* 34(2).
//! - Klein, J.P. & Moeschberger, M.L. (2003). *Survival Analysis*, 2nd ed.

mod cox;
mod kaplan_meier;
mod log_rank;
mod weibull;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, InferenceError, Result};

pub use cox::{concordance_index, cox_proportional_hazards, CoxModel};
pub use kaplan_meier::{kaplan_meier, kaplan_meier_with_level, KaplanMeierResult};
pub use log_rank::{log_rank_test, LogRankResult};
pub use weibull::{weibull_mle, WeibullModel};

/// One subject's observed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRecord {
    /// Time to event or censoring (≥ 0).
    pub time: f64,
    /// `true` if the event occurred at `time`, `false` if censored.
    pub event: bool,
    /// Covariate values (required by Cox regression).
    pub covariates: Option<Vec<f64>>,
}

impl SurvivalRecord {
    /// Record without covariates.
    pub fn new(time: f64, event: bool) -> Self {
        Self {
            time,
            event,
            covariates: None,
        }
    }

    /// Record with covariates.
    pub fn with_covariates(time: f64, event: bool, covariates: Vec<f64>) -> Self {
        Self {
            time,
            event,
            covariates: Some(covariates),
        }
    }
}

/// Fails unless there is at least one record and every time is finite and
/// non-negative.
pub(crate) fn validate_records(what: &'static str, records: &[SurvivalRecord]) -> Result<()> {
    ensure_len(what, records.len(), 1)?;
    for (i, r) in records.iter().enumerate() {
        if !r.time.is_finite() || r.time < 0.0 {
            return Err(InferenceError::InvalidInput(format!(
                "record {i} has invalid time {}",
                r.time
            )));
        }
    }
    Ok(())
}

/// Record indices ordered by ascending time.
pub(crate) fn time_order(records: &[SurvivalRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| records[a].time.total_cmp(&records[b].time));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_by_time() {
        let records = [
            SurvivalRecord::new(5.0, true),
            SurvivalRecord::new(1.0, false),
            SurvivalRecord::new(3.0, true),
        ];
        assert_eq!(time_order(&records), vec![1, 2, 0]);
    }

    #[test]
    fn test_invalid_times_are_rejected() {
        assert!(validate_records("records", &[]).is_err());
        assert!(validate_records("records", &[SurvivalRecord::new(-1.0, true)]).is_err());
        assert!(validate_records("records", &[SurvivalRecord::new(f64::NAN, true)]).is_err());
        assert!(validate_records("records", &[SurvivalRecord::new(0.0, false)]).is_ok());
    }
}
