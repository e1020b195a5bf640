//! Random variates for Monte Carlo estimation.
//!
//! All samplers take the generator explicitly; seeding is the caller's
//! choice, so a fixed seed reproduces every draw.

use std::f64::consts::PI;

use rand::Rng;

use crate::error::{InferenceError, Result};

/// Standard normal draw via the Box-Muller transform.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 − U keeps the logarithm's argument in (0, 1]
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Gamma(shape, 1) draw by Marsaglia-Tsang rejection sampling.
///
/// For shape < 1 the draw is boosted: G(a) = G(a+1) · U^{1/a}.
pub fn gamma<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> Result<f64> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(InferenceError::InvalidParameter(format!(
            "gamma shape must be positive, got {shape}"
        )));
    }
    Ok(gamma_unchecked(shape, rng))
}

pub(crate) fn gamma_unchecked<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        let u: f64 = 1.0 - rng.random::<f64>();
        return gamma_unchecked(shape + 1.0, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u: f64 = rng.random();
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Beta(α, β) draw as X / (X + Y) with X ~ Gamma(α), Y ~ Gamma(β).
pub fn beta<R: Rng + ?Sized>(alpha: f64, beta: f64, rng: &mut R) -> Result<f64> {
    for (name, value) in [("alpha", alpha), ("beta", beta)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(InferenceError::InvalidParameter(format!(
                "beta {name} must be positive, got {value}"
            )));
        }
    }
    Ok(beta_unchecked(alpha, beta, rng))
}

pub(crate) fn beta_unchecked<R: Rng + ?Sized>(alpha: f64, beta: f64, rng: &mut R) -> f64 {
    loop {
        let x = gamma_unchecked(alpha, rng);
        let y = gamma_unchecked(beta, rng);
        // both draws can underflow for tiny shapes
        if x + y > 0.0 {
            return x / (x + y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn moments(draws: &[f64]) -> (f64, f64) {
        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }

    #[test]
    fn test_normal_draws_are_standardized() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let draws: Vec<f64> = (0..50_000).map(|_| standard_normal(&mut rng)).collect();
        let (mean, var) = moments(&draws);
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(var, 1.0, epsilon = 0.03);
    }

    #[test]
    fn test_gamma_moments_match_shape() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        for shape in [0.5, 1.0, 3.0, 20.0] {
            let draws: Vec<f64> = (0..40_000)
                .map(|_| gamma(shape, &mut rng).expect("valid shape"))
                .collect();
            let (mean, var) = moments(&draws);
            assert!((mean - shape).abs() < 0.05 * shape.max(1.0), "shape {shape}: mean {mean}");
            assert!((var - shape).abs() < 0.1 * shape.max(1.0), "shape {shape}: var {var}");
            assert!(draws.iter().all(|&g| g >= 0.0));
        }
    }

    #[test]
    fn test_beta_draws_stay_in_unit_interval() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let draws: Vec<f64> = (0..20_000)
            .map(|_| beta(2.0, 6.0, &mut rng).expect("valid shapes"))
            .collect();
        assert!(draws.iter().all(|&b| (0.0..=1.0).contains(&b)));
        let (mean, _) = moments(&draws);
        assert_abs_diff_eq!(mean, 0.25, epsilon = 0.01);
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(gamma(0.0, &mut rng).is_err());
        assert!(beta(1.0, f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = Xoshiro256PlusPlus::seed_from_u64(99);
        let mut b = Xoshiro256PlusPlus::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(beta_unchecked(3.0, 4.0, &mut a), beta_unchecked(3.0, 4.0, &mut b));
        }
    }
}
