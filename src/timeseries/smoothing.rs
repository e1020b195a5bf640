//! Single and double (Holt) exponential smoothing.

use serde::{Deserialize, Serialize};

use super::{rmse, ForecastResult};
use crate::config::ForecastConfig;
use crate::error::{ensure_finite, ensure_len, InferenceError, Result};

fn check_constant(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(InferenceError::InvalidParameter(format!(
            "smoothing constant {name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Simple exponential smoothing
// ---------------------------------------------------------------------------

/// Result of simple exponential smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SesResult {
    /// Smoothed level Sₜ for every observation.
    pub smoothed: Vec<f64>,
    /// Next-step forecast (the final level).
    pub forecast: f64,
    /// RMSE of the one-step-ahead errors xₜ − Sₜ₋₁.
    pub rmse: f64,
}

/// Simple exponential smoothing: Sₜ = α·xₜ + (1−α)·Sₜ₋₁, S₁ = x₁.
///
/// With α = 1 the smoothed series equals the input.
///
/// # Examples
///
/// ```
/// use u_inference::timeseries::SimpleExponentialSmoothing;
///
/// let ses = SimpleExponentialSmoothing::new(0.3).unwrap();
/// let r = ses.smooth(&[10.0, 12.0, 13.0, 11.0, 14.0]).unwrap();
/// assert!((r.smoothed[1] - 10.6).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleExponentialSmoothing {
    alpha: f64,
}

impl SimpleExponentialSmoothing {
    /// Creates the smoother; `alpha` must lie in (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        check_constant("alpha", alpha)?;
        Ok(Self { alpha })
    }

    /// Smoothing constant α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooths a non-empty series.
    pub fn smooth(&self, data: &[f64]) -> Result<SesResult> {
        ensure_len("smoothing input", data.len(), 1)?;
        ensure_finite("smoothing input", data)?;

        let mut smoothed = Vec::with_capacity(data.len());
        let mut s = data[0];
        smoothed.push(s);
        for &x in &data[1..] {
            s = self.alpha * x + (1.0 - self.alpha) * s;
            smoothed.push(s);
        }

        let errors = data[1..].iter().zip(&smoothed).map(|(x, prev)| x - prev);
        Ok(SesResult {
            rmse: rmse(errors),
            forecast: s,
            smoothed,
        })
    }

    /// Flat forecast of the final level over `cfg.horizon` steps.
    ///
    /// Needs at least 2 observations so that an error estimate exists.
    pub fn forecast(&self, data: &[f64], cfg: &ForecastConfig) -> Result<ForecastResult> {
        cfg.validate()?;
        ensure_len("forecast input", data.len(), 2)?;
        let fit = self.smooth(data)?;
        ForecastResult::with_intervals(vec![fit.forecast; cfg.horizon], fit.rmse, cfg)
    }
}

// ---------------------------------------------------------------------------
// Holt linear trend
// ---------------------------------------------------------------------------

/// Result of Holt's linear smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoltResult {
    /// Level ℓₜ.
    pub level: Vec<f64>,
    /// Trend bₜ.
    pub trend: Vec<f64>,
    /// One-step-ahead fitted values ℓₜ₋₁ + bₜ₋₁ (the first is ℓ₀).
    pub fitted: Vec<f64>,
    /// RMSE of `data − fitted`.
    pub rmse: f64,
    last_level: f64,
    last_trend: f64,
}

impl HoltResult {
    /// h-step-ahead point forecast ℓₙ + h·bₙ.
    pub fn forecast(&self, h: usize) -> f64 {
        self.last_level + h as f64 * self.last_trend
    }
}

/// Holt's double exponential smoothing.
///
/// ```text
/// ℓₜ = α·xₜ + (1−α)(ℓₜ₋₁ + bₜ₋₁)
/// bₜ = β(ℓₜ − ℓₜ₋₁) + (1−β)·bₜ₋₁
/// ```
///
/// initialized with ℓ₀ = x₀ and b₀ = x₁ − x₀.
///
/// # Examples
///
/// ```
/// use u_inference::timeseries::HoltLinear;
///
/// let holt = HoltLinear::new(0.5, 0.5).unwrap();
/// let r = holt.smooth(&[10.0, 12.0, 14.0, 16.0, 18.0]).unwrap();
/// assert!((r.forecast(1) - 20.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltLinear {
    alpha: f64,
    beta: f64,
}

impl HoltLinear {
    /// Creates the smoother; both constants must lie in (0, 1].
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        check_constant("alpha", alpha)?;
        check_constant("beta", beta)?;
        Ok(Self { alpha, beta })
    }

    /// Level smoothing constant α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Trend smoothing constant β.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Smooths a series of at least 2 observations.
    pub fn smooth(&self, data: &[f64]) -> Result<HoltResult> {
        ensure_len("Holt input", data.len(), 2)?;
        ensure_finite("Holt input", data)?;

        let n = data.len();
        let mut level = Vec::with_capacity(n);
        let mut trend = Vec::with_capacity(n);
        let mut fitted = Vec::with_capacity(n);

        let mut l = data[0];
        let mut b = data[1] - data[0];
        level.push(l);
        trend.push(b);
        fitted.push(l);

        for &x in &data[1..] {
            let prediction = l + b;
            let next_l = self.alpha * x + (1.0 - self.alpha) * prediction;
            b = self.beta * (next_l - l) + (1.0 - self.beta) * b;
            l = next_l;
            fitted.push(prediction);
            level.push(l);
            trend.push(b);
        }

        let errors = data.iter().zip(&fitted).skip(1).map(|(x, f)| x - f);
        Ok(HoltResult {
            rmse: rmse(errors),
            level,
            trend,
            fitted,
            last_level: l,
            last_trend: b,
        })
    }

    /// Linear extrapolation of the final level and trend over
    /// `cfg.horizon` steps.
    pub fn forecast(&self, data: &[f64], cfg: &ForecastConfig) -> Result<ForecastResult> {
        cfg.validate()?;
        let fit = self.smooth(data)?;
        let forecast = (1..=cfg.horizon).map(|h| fit.forecast(h)).collect();
        ForecastResult::with_intervals(forecast, fit.rmse, cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ses_with_alpha_one_reproduces_input() {
        let data = [3.0, -1.5, 7.25, 0.0, 2.0];
        let ses = SimpleExponentialSmoothing::new(1.0).expect("valid alpha");
        let r = ses.smooth(&data).expect("should smooth");
        assert_eq!(r.smoothed, data.to_vec());
        assert_eq!(r.forecast, 2.0);
    }

    #[test]
    fn test_ses_recurrence_and_error() {
        let ses = SimpleExponentialSmoothing::new(0.3).expect("valid alpha");
        let r = ses.smooth(&[10.0, 12.0, 13.0]).expect("should smooth");
        // S = 10, 10.6, 11.32; errors 2.0, 2.4
        assert_abs_diff_eq!(r.smoothed[2], 11.32, epsilon = 1e-12);
        assert_abs_diff_eq!(r.rmse, ((4.0 + 5.76) / 2.0_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_ses_constant_series_has_tight_intervals() {
        let ses = SimpleExponentialSmoothing::new(0.5).expect("valid alpha");
        let f = ses.forecast(&[5.0; 10], &ForecastConfig::default()).expect("should forecast");
        assert_eq!(f.forecast.len(), 7);
        for ((&m, &lo), &hi) in f.forecast.iter().zip(&f.lower).zip(&f.upper) {
            assert_abs_diff_eq!(m, 5.0, epsilon = 1e-12);
            assert_abs_diff_eq!(lo, hi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smoothing_constants_are_validated() {
        assert!(SimpleExponentialSmoothing::new(0.0).is_err());
        assert!(SimpleExponentialSmoothing::new(1.1).is_err());
        assert!(HoltLinear::new(0.5, 0.0).is_err());
        assert!(HoltLinear::new(f64::NAN, 0.5).is_err());
        let ses = SimpleExponentialSmoothing::new(0.5).expect("valid alpha");
        assert!(ses.smooth(&[]).is_err());
        assert!(ses.forecast(&[1.0], &ForecastConfig::default()).is_err());
    }

    #[test]
    fn test_holt_tracks_linear_trend_exactly() {
        let holt = HoltLinear::new(0.5, 0.5).expect("valid constants");
        let data = [10.0, 12.0, 14.0, 16.0, 18.0];
        let r = holt.smooth(&data).expect("should smooth");
        assert_abs_diff_eq!(r.rmse, 0.0, epsilon = 1e-12);
        let f = holt
            .forecast(&data, &ForecastConfig { horizon: 3, confidence_level: 0.9 })
            .expect("should forecast");
        assert_abs_diff_eq!(f.forecast[0], 20.0, epsilon = 1e-10);
        assert_abs_diff_eq!(f.forecast[2], 24.0, epsilon = 1e-10);
    }

    #[test]
    fn test_holt_noisy_series_has_widening_intervals() {
        let holt = HoltLinear::new(0.4, 0.2).expect("valid constants");
        let data = [10.0, 12.5, 13.0, 16.5, 17.0, 20.5, 21.0, 23.5];
        let f = holt.forecast(&data, &ForecastConfig::default()).expect("should forecast");
        let widths: Vec<f64> = f.upper.iter().zip(&f.lower).map(|(u, l)| u - l).collect();
        assert!(widths[0] > 0.0);
        for w in widths.windows(2) {
            assert!(w[1] > w[0]);
        }
        assert!(f.decomposition.is_none());
    }

    #[test]
    fn test_holt_constant_series_trend_vanishes() {
        let holt = HoltLinear::new(0.3, 0.3).expect("valid constants");
        let r = holt.smooth(&[5.0; 20]).expect("should smooth");
        assert_abs_diff_eq!(*r.trend.last().expect("non-empty"), 0.0, epsilon = 1e-12);
        assert_eq!(r.fitted.len(), 20);
    }
}
