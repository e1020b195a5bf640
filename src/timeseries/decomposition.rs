//! Classical additive seasonal decomposition and trend-plus-season forecasts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{centered_moving_average, rmse, ForecastResult};
use crate::config::ForecastConfig;
use crate::error::{ensure_len, InferenceError, Result};

/// Additive decomposition x = trend + seasonal + residual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Centered moving average; `None` at the edges.
    pub trend: Vec<Option<f64>>,
    /// Seasonal component, `seasonal_indices[i % period]`.
    pub seasonal: Vec<f64>,
    /// x − trend − seasonal wherever the trend is defined.
    pub residual: Vec<Option<f64>>,
    /// One index per position in the cycle, summing to zero.
    pub seasonal_indices: Vec<f64>,
    /// Cycle length.
    pub period: usize,
}

/// Splits a series into trend, seasonal and residual parts.
///
/// # Algorithm
///
/// 1. Trend: centered moving average of length `period` (2×`period` for
///    even periods).
/// 2. Seasonal index for cycle position j: mean of `x − trend` over all
///    indices ≡ j (mod `period`) where the trend exists, then centered so
///    the indices sum to zero.
/// 3. Residual: `x − trend − seasonal`.
///
/// # Errors
///
/// `InvalidParameter` if `period < 2`, `InsufficientData` with fewer than
/// two full cycles.
///
/// # Examples
///
/// ```
/// use u_inference::timeseries::seasonal_decompose;
///
/// let data: Vec<f64> = (0..16).map(|i| [3.0, -1.0, -3.0, 1.0][i % 4] + i as f64).collect();
/// let d = seasonal_decompose(&data, 4).unwrap();
/// assert!((d.seasonal_indices[0] - 3.0).abs() < 1e-10);
/// ```
pub fn seasonal_decompose(data: &[f64], period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(InferenceError::InvalidParameter(format!(
            "seasonal period must be at least 2, got {period}"
        )));
    }
    ensure_len("seasonal decomposition input", data.len(), 2 * period)?;
    let trend = centered_moving_average(data, period)?;

    let mut sums = vec![0.0; period];
    let mut counts = vec![0_usize; period];
    for (i, (&x, t)) in data.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            sums[i % period] += x - t;
            counts[i % period] += 1;
        }
    }
    // Two full cycles leave at least one detrended value per position.
    let raw: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| s / c.max(1) as f64)
        .collect();
    let offset = raw.iter().sum::<f64>() / period as f64;
    let seasonal_indices: Vec<f64> = raw.iter().map(|s| s - offset).collect();

    let seasonal: Vec<f64> = (0..data.len()).map(|i| seasonal_indices[i % period]).collect();
    let residual = data
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((&x, t), &s)| t.map(|t| x - t - s))
        .collect();

    Ok(Decomposition {
        trend,
        seasonal,
        residual,
        seasonal_indices,
        period,
    })
}

/// Forecasts by extending a straight trend line and adding the seasonal
/// index of each future position.
///
/// The line is the least-squares fit of the defined trend values against
/// their time index. Interval width uses the RMSE of the decomposition
/// residuals. The decomposition is attached to the result.
pub fn seasonal_trend_forecast(
    data: &[f64],
    period: usize,
    cfg: &ForecastConfig,
) -> Result<ForecastResult> {
    cfg.validate()?;
    let decomposition = seasonal_decompose(data, period)?;

    let points: Vec<(f64, f64)> = decomposition
        .trend
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.map(|t| (i as f64, t)))
        .collect();
    let m = points.len() as f64;
    let x_bar = points.iter().map(|p| p.0).sum::<f64>() / m;
    let y_bar = points.iter().map(|p| p.1).sum::<f64>() / m;
    let sxx: f64 = points.iter().map(|p| (p.0 - x_bar).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - x_bar) * (p.1 - y_bar)).sum();
    let slope = sxy / sxx;
    let intercept = y_bar - slope * x_bar;
    debug!(period, slope, intercept, "seasonal trend line fitted");

    let n = data.len();
    let forecast = (0..cfg.horizon)
        .map(|k| {
            let t = n + k;
            intercept + slope * t as f64 + decomposition.seasonal_indices[t % period]
        })
        .collect();
    let error = rmse(decomposition.residual.iter().flatten().copied());

    let mut result = ForecastResult::with_intervals(forecast, error, cfg)?;
    result.decomposition = Some(decomposition);
    Ok(result)
}
