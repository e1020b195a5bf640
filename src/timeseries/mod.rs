//! Time-series smoothing, decomposition and forecasting.
//!
//! # Methods
//!
//! - [`SimpleExponentialSmoothing`]: level-only smoothing (Brown, 1956)
//! - [`HoltLinear`]: double exponential smoothing with trend (Holt, 1957)
//! - [`simple_moving_average`], [`centered_moving_average`]
//! - [`seasonal_decompose`]: classical additive decomposition
//! - [`seasonal_trend_forecast`]: linear trend plus seasonal index
//! - [`acf`], [`detect_seasonality`]: autocorrelation and period detection
//!
//! Forecasts come back as a [`ForecastResult`] whose prediction interval
//! at step h is ± z · RMSE · √h, with RMSE taken over the in-sample
//! one-step-ahead errors.
//!
//! # References
//!
//! - Brown, R.G. (1956). *Exponential Smoothing for Predicting Demand*.
//! - Holt, C.C. (1957). "Forecasting Seasonals and Trends by
//!   Exponentially Weighted Moving Averages", ONR Memo 52.
//! - Box, G.E.P. & Jenkins, G.M. (1976). *Time Series Analysis:
//!   Forecasting and Control*.

mod decomposition;
mod moving_average;
mod seasonality;
mod smoothing;

use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::distribution::Normal;
use crate::error::Result;

pub use decomposition::{seasonal_decompose, seasonal_trend_forecast, Decomposition};
pub use moving_average::{centered_moving_average, simple_moving_average};
pub use seasonality::{acf, detect_seasonality, AcfResult, SeasonalityResult};
pub use smoothing::{HoltLinear, HoltResult, SesResult, SimpleExponentialSmoothing};

/// Point forecasts with prediction intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Forecast for steps 1..=horizon.
    pub forecast: Vec<f64>,
    /// Lower prediction bound per step.
    pub lower: Vec<f64>,
    /// Upper prediction bound per step.
    pub upper: Vec<f64>,
    /// Components behind the forecast, for decomposition-based methods.
    pub decomposition: Option<Decomposition>,
}

impl ForecastResult {
    /// Builds intervals ± z · `rmse` · √h around `forecast`.
    fn with_intervals(forecast: Vec<f64>, rmse: f64, cfg: &ForecastConfig) -> Result<Self> {
        let z = Normal::standard().quantile(0.5 + cfg.confidence_level / 2.0)?;
        let (lower, upper) = forecast
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let half = z * rmse * ((i + 1) as f64).sqrt();
                (f - half, f + half)
            })
            .unzip();
        Ok(Self {
            forecast,
            lower,
            upper,
            decomposition: None,
        })
    }
}

/// Root mean square of the given errors; 0 for none.
fn rmse(errors: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = errors.fold((0.0, 0_usize), |(s, c), e| (s + e * e, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_intervals_widen_with_square_root_of_step() {
        let cfg = ForecastConfig {
            horizon: 4,
            confidence_level: 0.95,
        };
        let f = ForecastResult::with_intervals(vec![10.0; 4], 2.0, &cfg).expect("valid level");
        let half: Vec<f64> = f.upper.iter().zip(&f.forecast).map(|(u, m)| u - m).collect();
        assert_abs_diff_eq!(half[0], 1.959_963_984_540_054 * 2.0, epsilon = 1e-7);
        assert_abs_diff_eq!(half[3], 2.0 * half[0], epsilon = 1e-12);
        for (l, u) in f.lower.iter().zip(&f.upper) {
            assert_abs_diff_eq!(20.0 - u, *l, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rmse_of_errors() {
        assert_eq!(rmse(std::iter::empty()), 0.0);
        assert_abs_diff_eq!(rmse([3.0, -4.0].into_iter()), (12.5_f64).sqrt(), epsilon = 1e-15);
    }
}
