//! Trailing and centered moving averages.

use crate::error::{ensure_finite, ensure_len, InferenceError, Result};

/// Trailing moving average over a window of `window` observations.
///
/// Element `i` of the result averages `data[i..i + window]`, so the output
/// has `n − window + 1` entries.
///
/// # Errors
///
/// `InvalidParameter` for a zero window, `InsufficientData` when the
/// series is shorter than the window.
///
/// # Examples
///
/// ```
/// use u_inference::timeseries::simple_moving_average;
///
/// let ma = simple_moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
/// assert_eq!(ma, vec![2.0, 3.0, 4.0]);
/// ```
pub fn simple_moving_average(data: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(InferenceError::InvalidParameter(
            "moving-average window must be at least 1".into(),
        ));
    }
    ensure_len("moving-average input", data.len(), window)?;
    ensure_finite("moving-average input", data)?;

    let w = window as f64;
    let mut sum: f64 = data[..window].iter().sum();
    let mut out = Vec::with_capacity(data.len() - window + 1);
    out.push(sum / w);
    for i in window..data.len() {
        sum += data[i] - data[i - window];
        out.push(sum / w);
    }
    Ok(out)
}

/// Centered moving average of the given period, aligned with the input.
///
/// Odd periods average the `period` points around each index. Even
/// periods use the 2×`period` average: `period + 1` points with half
/// weight on both ends, so the window stays centered. The first and last
/// `period / 2` positions are `None`.
///
/// # Errors
///
/// `InvalidParameter` if `period < 2`, `InsufficientData` when the series
/// is too short for a single centered window.
pub fn centered_moving_average(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period < 2 {
        return Err(InferenceError::InvalidParameter(format!(
            "centered moving-average period must be at least 2, got {period}"
        )));
    }
    let half = period / 2;
    ensure_len("centered moving-average input", data.len(), 2 * half + 1)?;
    ensure_finite("centered moving-average input", data)?;

    let n = data.len();
    let p = period as f64;
    let mut out = vec![None; n];
    for (i, slot) in out.iter_mut().enumerate().take(n - half).skip(half) {
        let window = &data[i - half..=i + half];
        let value = if period % 2 == 1 {
            window.iter().sum::<f64>() / p
        } else {
            let inner: f64 = window[1..window.len() - 1].iter().sum();
            (inner + 0.5 * (window[0] + window[window.len() - 1])) / p
        };
        *slot = Some(value);
    }
    Ok(out)
}
