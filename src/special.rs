//! Special mathematical functions.
//!
//! Log-gamma, regularized incomplete gamma and beta functions, the error
//! function, and normal / Student-t quantile approximations. These are the
//! numerical foundation for every CDF in [`distribution`](crate::distribution).
//!
//! # Accuracy
//!
//! | Function | Method | Accuracy |
//! |---|---|---|
//! | [`ln_gamma`] | Lanczos (g = 7, 9 terms) | ~2e-10 relative |
//! | [`regularized_gamma_p`] | series (x < a+1) / continued fraction | ~1e-10 |
//! | [`regularized_incomplete_beta`] | Lentz continued fraction + symmetry | ~1e-10 |
//! | [`inverse_normal_cdf`] | Beasley-Springer-Moro | ~3e-9 absolute |
//! | [`t_quantile`] | Cornish-Fisher expansion | ~1e-3 for df ≥ 3, exact for df ≤ 2 |
//!
//! Continued fractions stop when the relative change of the convergent
//! falls below 1e-10 and are capped at 100 iterations. A truncated
//! evaluation returns its last convergent.
//!
//! # References
//!
//! - Lanczos (1964). "A Precision Approximation of the Gamma Function",
//!   *SIAM Journal on Numerical Analysis* 1(1).
//! - Press et al. (2007). *Numerical Recipes*, 3rd ed., §6.2 and §6.4.
//! - Moro (1995). "The Full Monte", *Risk* 8(2).
//! - Abramowitz & Stegun (1964), 26.7.5.

use std::f64::consts::PI;

/// Relative-change stopping rule for continued fractions.
const CF_EPS: f64 = 1e-10;

/// Continued-fraction iteration cap.
const CF_MAX_ITER: usize = 100;

/// Floor that keeps Lentz denominators away from zero.
const TINY: f64 = 1e-30;

/// Power series cap for the lower incomplete gamma function.
const SERIES_MAX_TERMS: usize = 500;

const SERIES_EPS: f64 = 1e-15;

// ---------------------------------------------------------------------------
// Continued fractions
// ---------------------------------------------------------------------------

/// Result of a continued-fraction evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContinuedFraction {
    pub value: f64,
    pub terms: usize,
    pub converged: bool,
}

/// Evaluates `b₀ + a₁/(b₁ + a₂/(b₂ + …))` by the modified Lentz method.
///
/// `term(j)` returns `(aⱼ, bⱼ)` for `j ≥ 1`. Evaluation stops when the
/// multiplicative update differs from 1 by less than [`CF_EPS`] or after
/// `max_terms` terms, in which case the last convergent is returned.
pub(crate) fn continued_fraction<F>(b0: f64, max_terms: usize, mut term: F) -> ContinuedFraction
where
    F: FnMut(usize) -> (f64, f64),
{
    let mut f = if b0.abs() < TINY { TINY } else { b0 };
    let mut c = f;
    let mut d = 0.0;

    for j in 1..=max_terms {
        let (a, b) = term(j);
        d = b + a * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + a / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = c * d;
        f *= delta;
        if (delta - 1.0).abs() < CF_EPS {
            return ContinuedFraction {
                value: f,
                terms: j,
                converged: true,
            };
        }
    }

    tracing::warn!(max_terms, value = f, "continued fraction truncated");
    ContinuedFraction {
        value: f,
        terms: max_terms,
        converged: false,
    }
}

// ---------------------------------------------------------------------------
// Gamma family
// ---------------------------------------------------------------------------

/// Natural logarithm of the gamma function, ln Γ(x), for x > 0.
///
/// Lanczos approximation with g = 7; arguments below 0.5 go through the
/// reflection formula Γ(x)Γ(1−x) = π / sin(πx).
///
/// # Examples
///
/// ```
/// use u_inference::special::ln_gamma;
///
/// assert!(ln_gamma(1.0).abs() < 1e-12);
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Gamma function Γ(x) = exp(ln Γ(x)) for x > 0.
pub fn gamma(x: f64) -> f64 {
    ln_gamma(x).exp()
}

/// Log of the beta function: ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b).
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Regularized lower incomplete gamma function P(a, x) = γ(a, x) / Γ(a).
///
/// Uses the power series when `x < a + 1` and the continued fraction for
/// Q = 1 − P otherwise; each form is only stable on its own side of that
/// switch point. Returns 0 at `x = 0` and 1 at `x = ∞` directly.
///
/// # Examples
///
/// ```
/// use u_inference::special::regularized_gamma_p;
///
/// // P(1, x) = 1 − e^{−x}
/// let p = regularized_gamma_p(1.0, 2.0);
/// assert!((p - (1.0 - (-2.0_f64).exp())).abs() < 1e-10);
/// ```
pub fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    if x < a + 1.0 {
        gamma_series(a, x)
    } else {
        1.0 - gamma_continued_fraction(a, x)
    }
}

/// Regularized upper incomplete gamma function Q(a, x) = 1 − P(a, x).
///
/// Evaluated directly (not as `1 − P`) on the continued-fraction side so
/// that small upper-tail probabilities keep their relative precision.
pub fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_series(a, x)
    } else {
        gamma_continued_fraction(a, x)
    }
}

fn gamma_prefix(a: f64, x: f64) -> f64 {
    (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;
    for _ in 0..SERIES_MAX_TERMS {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * SERIES_EPS {
            break;
        }
    }
    (sum * gamma_prefix(a, x)).clamp(0.0, 1.0)
}

/// Q(a, x) via the Legendre continued fraction
/// `1/(x+1−a − 1·(1−a)/(x+3−a − 2·(2−a)/(x+5−a − …)))`.
fn gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let cf = continued_fraction(0.0, CF_MAX_ITER, |j| {
        if j == 1 {
            (1.0, x + 1.0 - a)
        } else {
            let k = (j - 1) as f64;
            (-k * (k - a), x + 2.0 * k + 1.0 - a)
        }
    });
    (gamma_prefix(a, x) * cf.value).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Beta family
// ---------------------------------------------------------------------------

/// Regularized incomplete beta function I_x(a, b).
///
/// Lentz continued fraction, evaluated on whichever side of
/// `(a+1)/(a+b+2)` converges: for larger `x` the symmetry
/// I_x(a, b) = 1 − I_{1−x}(b, a) is applied first. Returns 0 at `x = 0` and
/// 1 at `x = 1` directly.
///
/// # Examples
///
/// ```
/// use u_inference::special::regularized_incomplete_beta;
///
/// // I_x(a, 1) = x^a
/// assert!((regularized_incomplete_beta(0.3, 2.0, 1.0) - 0.09).abs() < 1e-10);
/// // symmetric case
/// assert!((regularized_incomplete_beta(0.5, 4.0, 4.0) - 0.5).abs() < 1e-10);
/// ```
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_front = a * x.ln() + b * (1.0 - x).ln() - ln_beta(a, b);

    // Each iteration consumes one even and one odd coefficient.
    let cf = continued_fraction(0.0, 2 * CF_MAX_ITER, |j| {
        if j == 1 {
            (1.0, 1.0)
        } else {
            (beta_cf_coefficient(j - 1, x, a, b), 1.0)
        }
    });

    (ln_front.exp() * cf.value / a).clamp(0.0, 1.0)
}

/// Coefficient d_k of the incomplete-beta continued fraction.
fn beta_cf_coefficient(k: usize, x: f64, a: f64, b: f64) -> f64 {
    let m = (k / 2) as f64;
    if k % 2 == 0 {
        m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m))
    } else {
        -(a + m) * (a + b + m) * x / ((a + 2.0 * m) * (a + 2.0 * m + 1.0))
    }
}

// ---------------------------------------------------------------------------
// Error function and the normal distribution
// ---------------------------------------------------------------------------

/// Error function erf(x) = sign(x) · P(½, x²).
///
/// # Examples
///
/// ```
/// use u_inference::special::erf;
///
/// assert!((erf(1.0) - 0.8427007929497149).abs() < 1e-9);
/// assert!((erf(-1.0) + erf(1.0)).abs() < 1e-15);
/// ```
pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        -erf(-x)
    } else {
        regularized_gamma_p(0.5, x * x)
    }
}

/// Complementary error function erfc(x) = 1 − erf(x).
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        1.0 + regularized_gamma_p(0.5, x * x)
    } else {
        regularized_gamma_q(0.5, x * x)
    }
}

/// Standard normal density φ(z).
pub fn standard_normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

/// Standard normal CDF Φ(z) = ½ erfc(−z/√2).
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Inverse standard normal CDF Φ⁻¹(p) by the Beasley-Springer-Moro
/// rational approximation.
///
/// Returns −∞ at `p = 0`, +∞ at `p = 1`, and NaN outside [0, 1].
///
/// # Examples
///
/// ```
/// use u_inference::special::inverse_normal_cdf;
///
/// assert!((inverse_normal_cdf(0.975) - 1.959963984540054).abs() < 1e-7);
/// assert!(inverse_normal_cdf(0.5).abs() < 1e-12);
/// ```
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 4] = [
        2.50662823884,
        -18.61500062529,
        41.39119773534,
        -25.44106049637,
    ];
    const B: [f64; 4] = [
        -8.47351093090,
        23.08336743743,
        -21.06224101826,
        3.13082909833,
    ];
    #[allow(clippy::excessive_precision)]
    const C: [f64; 9] = [
        0.3374754822726147,
        0.9761690190917186,
        0.1607979714918209,
        0.0276438810333863,
        0.0038405729373609,
        0.0003951896511919,
        0.0000321767881768,
        0.0000002888167364,
        0.0000003960315187,
    ];

    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let y = p - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let num = y * (((A[3] * r + A[2]) * r + A[1]) * r + A[0]);
        let den = (((B[3] * r + B[2]) * r + B[1]) * r + B[0]) * r + 1.0;
        return num / den;
    }

    let r = if y < 0.0 { p } else { 1.0 - p };
    let s = (-r.ln()).ln();
    let mut x = C[8];
    for &c in C[..8].iter().rev() {
        x = x * s + c;
    }
    if y < 0.0 {
        -x
    } else {
        x
    }
}

/// Student-t quantile by a Cornish-Fisher expansion around the normal
/// quantile, with the closed forms for df = 1 and df = 2.
///
/// This is a starting approximation; [`StudentT::quantile`] polishes it
/// against the exact CDF.
///
/// [`StudentT::quantile`]: crate::distribution::StudentT::quantile
///
/// # Examples
///
/// ```
/// use u_inference::special::t_quantile;
///
/// assert!((t_quantile(0.975, 10.0) - 2.228138852).abs() < 1e-3);
/// assert!((t_quantile(0.75, 1.0) - 1.0).abs() < 1e-12);
/// ```
pub fn t_quantile(p: f64, df: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if df == 1.0 {
        return (PI * (p - 0.5)).tan();
    }
    if df == 2.0 {
        return (2.0 * p - 1.0) / (2.0 * p * (1.0 - p)).sqrt();
    }

    let z = inverse_normal_cdf(p);
    let z2 = z * z;
    let z3 = z2 * z;
    let z5 = z3 * z2;
    let z7 = z5 * z2;
    let z9 = z7 * z2;

    let g1 = (z3 + z) / 4.0;
    let g2 = (5.0 * z5 + 16.0 * z3 + 3.0 * z) / 96.0;
    let g3 = (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / 384.0;
    let g4 = (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / 92160.0;

    z + g1 / df + g2 / df.powi(2) + g3 / df.powi(3) + g4 / df.powi(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ln_gamma_known_values() {
        assert_abs_diff_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ln_gamma(2.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ln_gamma(0.5), 0.572_364_942_924_700_1, epsilon = 1e-10);
        assert_abs_diff_eq!(ln_gamma(10.0), 12.801_827_480_081_469, epsilon = 1e-9);
        assert_abs_diff_eq!(gamma(5.0), 24.0, epsilon = 1e-8);
    }

    #[test]
    fn test_ln_gamma_reflection_branch() {
        // Γ(0.25) = 3.6256099082219083
        assert_abs_diff_eq!(ln_gamma(0.25), 3.625_609_908_221_908_3_f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_gamma_p_series_and_fraction_sides() {
        // x < a + 1: series
        assert_abs_diff_eq!(regularized_gamma_p(3.0, 2.0), 0.323_323_583_816_936_5, epsilon = 1e-10);
        assert_abs_diff_eq!(regularized_gamma_p(0.5, 0.1), 0.345_279_153_981_423, epsilon = 1e-10);
        // x ≥ a + 1: continued fraction
        assert_abs_diff_eq!(regularized_gamma_p(3.0, 5.0), 0.875_347_980_516_918_9, epsilon = 1e-10);
    }

    #[test]
    fn test_gamma_p_and_q_are_complementary() {
        for &(a, x) in &[(0.5, 0.3), (2.0, 1.0), (4.0, 9.0), (30.0, 25.0), (30.0, 40.0)] {
            let sum = regularized_gamma_p(a, x) + regularized_gamma_q(a, x);
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gamma_p_endpoints_skip_iteration() {
        assert_eq!(regularized_gamma_p(2.0, 0.0), 0.0);
        assert_eq!(regularized_gamma_p(2.0, f64::INFINITY), 1.0);
        assert_eq!(regularized_gamma_q(2.0, 0.0), 1.0);
    }

    #[test]
    fn test_incomplete_beta_closed_forms() {
        assert_abs_diff_eq!(regularized_incomplete_beta(0.3, 2.0, 1.0), 0.09, epsilon = 1e-10);
        assert_abs_diff_eq!(regularized_incomplete_beta(0.4, 1.0, 3.0), 0.784, epsilon = 1e-10);
        assert_abs_diff_eq!(regularized_incomplete_beta(0.5, 7.0, 7.0), 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(regularized_incomplete_beta(0.4, 2.0, 3.0), 0.5248, epsilon = 1e-10);
    }

    #[test]
    fn test_incomplete_beta_reference_values() {
        assert_abs_diff_eq!(
            regularized_incomplete_beta(0.3, 2.5, 4.0),
            0.352_197_585_906_767_2,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            regularized_incomplete_beta(0.2, 0.5, 0.5),
            0.295_167_235_300_866_6,
            epsilon = 1e-9
        );
        // large parameters, as seen in A/B posteriors
        assert_abs_diff_eq!(
            regularized_incomplete_beta(0.9, 921.0, 81.0),
            0.017_176_940_181_429_29,
            epsilon = 1e-7
        );
    }

    #[test]
    fn test_incomplete_beta_endpoints() {
        assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_incomplete_beta(1.0, 2.0, 3.0), 1.0);
    }

    #[test]
    fn test_incomplete_beta_symmetry() {
        let (x, a, b) = (0.35, 3.5, 1.5);
        let lhs = regularized_incomplete_beta(x, a, b);
        let rhs = 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn test_erf_reference_values() {
        assert_abs_diff_eq!(erf(0.0), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(erf(0.5), 0.520_499_877_813_046_5, epsilon = 1e-10);
        assert_abs_diff_eq!(erf(1.0), 0.842_700_792_949_714_9, epsilon = 1e-10);
        assert_abs_diff_eq!(erfc(1.0), 1.0 - 0.842_700_792_949_714_9, epsilon = 1e-10);
        assert!(erf(6.0) <= 1.0 && erf(-6.0) >= -1.0);
    }

    #[test]
    fn test_normal_cdf_reference_values() {
        assert_abs_diff_eq!(standard_normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(standard_normal_cdf(1.96), 0.975_002_104_851_779_6, epsilon = 1e-10);
        // lower tail keeps relative precision
        let tail = standard_normal_cdf(-8.0);
        assert!((tail / 6.220_960_574_271_784e-16 - 1.0).abs() < 1e-6, "tail = {tail}");
    }

    #[test]
    fn test_inverse_normal_reference_values() {
        assert_abs_diff_eq!(inverse_normal_cdf(0.975), 1.959_963_984_540_054, epsilon = 1e-8);
        assert_abs_diff_eq!(inverse_normal_cdf(0.001), -3.090_232_306_167_813_5, epsilon = 1e-8);
        assert_eq!(inverse_normal_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(inverse_normal_cdf(1.0), f64::INFINITY);
        assert!(inverse_normal_cdf(1.5).is_nan());
    }

    #[test]
    fn test_t_quantile_closed_forms_and_expansion() {
        assert_abs_diff_eq!(t_quantile(0.75, 1.0), 1.0, epsilon = 1e-12);
        // df = 2: t = (2p−1)/√(2p(1−p))
        assert_abs_diff_eq!(t_quantile(0.9, 2.0), 1.885_618_083_164_126_7, epsilon = 1e-10);
        assert_abs_diff_eq!(t_quantile(0.975, 10.0), 2.228_138_851_986_274_7, epsilon = 1e-3);
        assert_abs_diff_eq!(t_quantile(0.95, 30.0), 1.697_260_886_593_957_8, epsilon = 1e-4);
        assert_abs_diff_eq!(t_quantile(0.5, 7.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_continued_fraction_truncation_returns_last_convergent() {
        // 1 + 1/(1 + 1/(1 + …)) converges to the golden ratio.
        let cf = continued_fraction(1.0, 3, |_| (1.0, 1.0));
        assert!(!cf.converged);
        assert_eq!(cf.terms, 3);
        assert_abs_diff_eq!(cf.value, 5.0 / 3.0, epsilon = 1e-12);

        let cf = continued_fraction(1.0, 100, |_| (1.0, 1.0));
        assert!(cf.converged);
        assert_abs_diff_eq!(cf.value, (1.0 + 5.0_f64.sqrt()) / 2.0, epsilon = 1e-9);
    }
}
