//! Sample autocorrelation and seasonal period detection.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_len, InferenceError, Result};

/// ACF value a peak must exceed to count as a seasonal period.
const PEAK_THRESHOLD: f64 = 0.3;

/// Sample autocorrelation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfResult {
    /// r(0), r(1), …, r(max_lag); r(0) = 1.
    pub acf: Vec<f64>,
    /// Approximate 95% white-noise band ±1.96/√n.
    pub confidence_threshold: f64,
}

/// Result of seasonal period detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityResult {
    /// Autocorrelations up to the requested lag.
    pub acf: Vec<f64>,
    /// Lag of the strongest local ACF peak above 0.3, if any.
    pub period: Option<usize>,
    /// ACF value at the detected period.
    pub strength: Option<f64>,
}

/// Sample autocorrelation up to `max_lag` (clamped to n − 1).
///
/// ```text
/// r(k) = Σₜ (xₜ − x̄)(xₜ₊ₖ − x̄) / Σₜ (xₜ − x̄)²
/// ```
///
/// The biased (divide-by-n) autocovariance keeps the sequence positive
/// semi-definite and every value within [−1, 1].
///
/// # Errors
///
/// `InsufficientData` for fewer than 2 points, `InvalidParameter` for
/// `max_lag == 0`, `InvalidInput` for non-finite data, `ZeroVariance` for
/// a constant series.
///
/// # References
///
/// Box, G.E.P. & Jenkins, G.M. (1976). *Time Series Analysis*, §2.1.
///
/// # Examples
///
/// ```
/// use u_inference::timeseries::acf;
///
/// let r = acf(&[1.0, 3.0, 2.0, 5.0, 4.0, 7.0, 6.0, 8.0], 3).unwrap();
/// assert_eq!(r.acf.len(), 4);
/// assert!((r.acf[0] - 1.0).abs() < 1e-12);
/// ```
pub fn acf(data: &[f64], max_lag: usize) -> Result<AcfResult> {
    ensure_len("autocorrelation input", data.len(), 2)?;
    if max_lag == 0 {
        return Err(InferenceError::InvalidParameter(
            "autocorrelation max_lag must be at least 1".into(),
        ));
    }
    ensure_finite("autocorrelation input", data)?;

    let n = data.len();
    let max_lag = max_lag.min(n - 1);
    let mean = data.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();

    let c0: f64 = centered.iter().map(|d| d * d).sum();
    if c0 <= 0.0 {
        return Err(InferenceError::ZeroVariance("autocorrelation"));
    }

    let values = (0..=max_lag)
        .map(|lag| {
            let ck: f64 = centered[..n - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum();
            ck / c0
        })
        .collect();

    Ok(AcfResult {
        acf: values,
        confidence_threshold: 1.96 / (n as f64).sqrt(),
    })
}

/// Detects a seasonal period from the autocorrelation function.
///
/// A lag k ≥ 2 is a local peak when r(k) > r(k−1) and r(k) ≥ r(k+1) (the
/// last computed lag only needs the first condition). The strongest peak
/// with r(k) > 0.3 is reported.
///
/// # Errors
///
/// Same as [`acf`].
pub fn detect_seasonality(data: &[f64], max_lag: usize) -> Result<SeasonalityResult> {
    let values = acf(data, max_lag)?.acf;

    let best = (2..values.len())
        .filter(|&k| {
            let rises = values[k] > values[k - 1];
            let holds = values.get(k + 1).map_or(true, |&next| values[k] >= next);
            rises && holds && values[k] > PEAK_THRESHOLD
        })
        .max_by(|&a, &b| values[a].total_cmp(&values[b]));

    Ok(SeasonalityResult {
        period: best,
        strength: best.map(|k| values[k]),
        acf: values,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn acf_is_bounded(data in proptest::collection::vec(-1e3_f64..1e3, 5..=50)) {
            if let Ok(r) = acf(&data, 10) {
                prop_assert!((r.acf[0] - 1.0).abs() < 1e-10);
                for (i, &v) in r.acf.iter().enumerate() {
                    prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&v), "ACF[{i}] = {v}");
                }
            }
        }

        #[test]
        fn detected_period_clears_threshold(data in proptest::collection::vec(-1e3_f64..1e3, 8..=60)) {
            if let Ok(r) = detect_seasonality(&data, 12) {
                if let Some(p) = r.period {
                    prop_assert!(p >= 2);
                    prop_assert!(r.acf[p] > PEAK_THRESHOLD);
                }
            }
        }
    }
}
