//! Descriptive statistics used by the tests and models.
//!
//! - **Mean**: Kahan compensated summation.
//! - **Variance**: Welford's online algorithm (Welford 1962,
//!   *Technometrics* 4(3)), which avoids the cancellation of
//!   `E[X²] − E[X]²`.
//! - **Ranks**: average ranks for ties, as required by the rank-based tests.

use crate::error::{ensure_len, Result};

/// Sum with Kahan compensation.
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut comp = 0.0;
    for &x in data {
        let y = x - comp;
        let t = sum + y;
        comp = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Arithmetic mean. Fails on an empty slice.
///
/// ```
/// use u_inference::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
/// assert!(mean(&[]).is_err());
/// ```
pub fn mean(data: &[f64]) -> Result<f64> {
    ensure_len("mean", data.len(), 1)?;
    Ok(kahan_sum(data) / data.len() as f64)
}

/// Sample variance with Bessel's correction (denominator n − 1).
///
/// ```
/// use u_inference::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.571428571428571).abs() < 1e-12);
/// ```
pub fn variance(data: &[f64]) -> Result<f64> {
    ensure_len("variance", data.len(), 2)?;
    let mut count = 0.0;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for &x in data {
        count += 1.0;
        let delta = x - mean;
        mean += delta / count;
        m2 += delta * (x - mean);
    }
    Ok(m2 / (count - 1.0))
}

/// Sample standard deviation.
pub fn std_dev(data: &[f64]) -> Result<f64> {
    variance(data).map(f64::sqrt)
}

/// Sorts values ascending, treating NaN as equal (callers reject NaN first).
pub(crate) fn sort_ascending(data: &mut [f64]) {
    data.sort_by(|a, b| a.total_cmp(b));
}

/// Average ranks (1-based) of values that are already sorted ascending.
///
/// Tied values share the mean of the ranks they occupy.
pub fn average_ranks(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j] == sorted[i] {
            j += 1;
        }
        // Positions i..j are tied; average rank = (i+1 + j) / 2
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Tie correction Σ tₖ(tₖ² − 1) over groups of tied values in a sorted slice.
pub fn tie_correction(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let mut correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            correction += t * (t * t - 1.0);
        }
        i = j;
    }
    correction
}
