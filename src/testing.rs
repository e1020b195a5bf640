//! Hypothesis testing.
//!
//! Parametric and non-parametric tests: t-tests, one-way ANOVA, chi-squared
//! tests, Mann-Whitney U, two-sample Kolmogorov-Smirnov, and the Pearson
//! correlation test.
//!
//! Every test takes a [`TestConfig`] (significance level, alternative,
//! variance pooling, interval coverage) and returns an immutable result.
//! Inputs below a test's minimum size, non-finite values, and zero standard
//! errors are reported as [`InferenceError`]s; no test substitutes a default
//! statistic.
//!
//! # Examples
//!
//! ```
//! use u_inference::config::TestConfig;
//! use u_inference::testing::one_sample_t_test;
//!
//! let data = [5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9];
//! let result = one_sample_t_test(&data, 5.0, &TestConfig::default()).unwrap();
//! assert!(!result.reject); // cannot reject H₀: μ = 5.0
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Alternative, TestConfig};
use crate::distribution::{kolmogorov_sf, ChiSquared, FisherF, Normal, StudentT};
use crate::error::{ensure_finite, ensure_len, InferenceError, Result};
use crate::stats;

/// Standardized magnitude of an effect, tagged by its measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EffectSize {
    /// Mean difference in pooled standard deviations.
    CohensD(f64),
    /// Association strength of a contingency table, in [0, 1].
    CramersV(f64),
    /// Share of total variance explained by group membership.
    EtaSquared(f64),
    /// Rank-biserial correlation of a Mann-Whitney comparison, in [−1, 1].
    RankBiserial(f64),
    /// Pearson product-moment correlation, in [−1, 1].
    PearsonR(f64),
}

impl EffectSize {
    /// The numeric value regardless of measure.
    pub fn value(&self) -> f64 {
        match *self {
            EffectSize::CohensD(v)
            | EffectSize::CramersV(v)
            | EffectSize::EtaSquared(v)
            | EffectSize::RankBiserial(v)
            | EffectSize::PearsonR(v) => v,
        }
    }
}

/// Result of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test statistic (t, χ², U, D, ... depending on the test).
    pub statistic: f64,
    /// Degrees of freedom (fractional for Welch; 0 for rank and KS tests).
    pub df: f64,
    /// p-value under the configured alternative, in [0, 1].
    pub p_value: f64,
    /// `p_value < alpha`.
    pub reject: bool,
    /// Interval for the tested parameter at the configured confidence level.
    pub confidence_interval: Option<(f64, f64)>,
    /// Effect size, when the test defines one.
    pub effect_size: Option<EffectSize>,
}

impl TestResult {
    fn new(statistic: f64, df: f64, p_value: f64, cfg: &TestConfig) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        Self {
            statistic,
            df,
            p_value,
            reject: p_value < cfg.alpha,
            confidence_interval: None,
            effect_size: None,
        }
    }

    fn with_interval(mut self, interval: (f64, f64)) -> Self {
        self.confidence_interval = Some(interval);
        self
    }

    fn with_effect(mut self, effect: EffectSize) -> Self {
        self.effect_size = Some(effect);
        self
    }
}

/// p-value of a t statistic under the chosen alternative.
fn t_p_value(t: f64, dist: &StudentT, alternative: Alternative) -> f64 {
    match alternative {
        Alternative::TwoSided => 2.0 * dist.sf(t.abs()),
        Alternative::Greater => dist.sf(t),
        Alternative::Less => dist.cdf(t),
    }
}

/// p-value of a standard normal statistic under the chosen alternative.
fn z_p_value(z: f64, alternative: Alternative) -> f64 {
    let dist = Normal::standard();
    match alternative {
        Alternative::TwoSided => 2.0 * dist.sf(z.abs()),
        Alternative::Greater => dist.sf(z),
        Alternative::Less => dist.cdf(z),
    }
}

/// Two-sided `estimate ± t* · se` interval.
fn t_interval(estimate: f64, se: f64, dist: &StudentT, cfg: &TestConfig) -> Result<(f64, f64)> {
    let crit = dist.quantile(0.5 + cfg.confidence_level / 2.0)?;
    Ok((estimate - crit * se, estimate + crit * se))
}

// ---------------------------------------------------------------------------
// t-tests
// ---------------------------------------------------------------------------

fn location_t_test(
    data: &[f64],
    mu0: f64,
    cfg: &TestConfig,
    what: &'static str,
) -> Result<TestResult> {
    cfg.validate()?;
    ensure_len(what, data.len(), 2)?;
    ensure_finite(what, data)?;
    if !mu0.is_finite() {
        return Err(InferenceError::InvalidParameter(format!(
            "hypothesized mean must be finite, got {mu0}"
        )));
    }

    let n = data.len() as f64;
    let mean = stats::mean(data)?;
    let sd = stats::std_dev(data)?;
    if sd <= f64::EPSILON * mean.abs() || sd == 0.0 {
        return Err(InferenceError::ZeroVariance(what));
    }

    let se = sd / n.sqrt();
    let t = (mean - mu0) / se;
    let dist = StudentT::new(n - 1.0)?;
    let p_value = t_p_value(t, &dist, cfg.alternative);

    Ok(TestResult::new(t, n - 1.0, p_value, cfg)
        .with_interval(t_interval(mean, se, &dist, cfg)?)
        .with_effect(EffectSize::CohensD((mean - mu0) / sd)))
}

/// One-sample t-test: H₀: μ = μ₀.
///
/// # Algorithm
///
/// t = (x̄ − μ₀) / (s / √n), df = n − 1. The confidence interval is for μ;
/// Cohen's d = (x̄ − μ₀) / s.
///
/// # Errors
///
/// `InsufficientData` for fewer than 2 observations, `InvalidInput` for
/// non-finite values, `ZeroVariance` when every observation is equal.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::one_sample_t_test;
///
/// let data = [68.0, 70.0, 72.0, 74.0, 76.0];
/// let r = one_sample_t_test(&data, 70.0, &TestConfig::default()).unwrap();
/// assert!((r.statistic - 2.0_f64.sqrt()).abs() < 1e-12);
/// assert!((r.p_value - 0.2302).abs() < 1e-3);
/// ```
pub fn one_sample_t_test(data: &[f64], mu0: f64, cfg: &TestConfig) -> Result<TestResult> {
    location_t_test(data, mu0, cfg, "one-sample t-test")
}

/// Two-sample t-test: H₀: μ₁ = μ₂.
///
/// # Algorithm
///
/// With `cfg.equal_variance` the pooled (Student) form is used:
/// sₚ² = ((n₁−1)s₁² + (n₂−1)s₂²) / (n₁+n₂−2), df = n₁+n₂−2.
/// Otherwise Welch's form: se² = s₁²/n₁ + s₂²/n₂ with Welch-Satterthwaite
/// degrees of freedom. Cohen's d always uses the pooled standard deviation.
///
/// Swapping the samples negates the statistic, the effect size, and the
/// interval; the two-sided p-value is unchanged.
///
/// # References
///
/// Welch (1947). "The generalization of Student's problem when several
/// different population variances are involved". Biometrika, 34, 28–35.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::two_sample_t_test;
///
/// let a = [5.1, 4.9, 5.2, 5.0, 4.8];
/// let b = [7.1, 6.9, 7.2, 7.0, 6.8];
/// let r = two_sample_t_test(&a, &b, &TestConfig::default()).unwrap();
/// assert!(r.p_value < 0.01);
/// ```
pub fn two_sample_t_test(a: &[f64], b: &[f64], cfg: &TestConfig) -> Result<TestResult> {
    cfg.validate()?;
    ensure_len("two-sample t-test (first sample)", a.len(), 2)?;
    ensure_len("two-sample t-test (second sample)", b.len(), 2)?;
    ensure_finite("first sample", a)?;
    ensure_finite("second sample", b)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = stats::mean(a)?;
    let mean2 = stats::mean(b)?;
    let var1 = stats::variance(a)?;
    let var2 = stats::variance(b)?;

    let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
    if pooled_var <= 0.0 {
        return Err(InferenceError::ZeroVariance("two-sample t-test"));
    }

    let (se, df) = if cfg.equal_variance {
        (
            (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(),
            n1 + n2 - 2.0,
        )
    } else {
        // Welch-Satterthwaite degrees of freedom
        let v1 = var1 / n1;
        let v2 = var2 / n2;
        let df = (v1 + v2).powi(2) / (v1 * v1 / (n1 - 1.0) + v2 * v2 / (n2 - 1.0));
        ((v1 + v2).sqrt(), df)
    };

    let diff = mean1 - mean2;
    let t = diff / se;
    let dist = StudentT::new(df)?;
    let p_value = t_p_value(t, &dist, cfg.alternative);

    Ok(TestResult::new(t, df, p_value, cfg)
        .with_interval(t_interval(diff, se, &dist, cfg)?)
        .with_effect(EffectSize::CohensD(diff / pooled_var.sqrt())))
}

/// Paired t-test: H₀: mean difference = 0.
///
/// Computes dᵢ = xᵢ − yᵢ and applies the one-sample test with μ₀ = 0.
///
/// # Errors
///
/// `DimensionMismatch` when the slices differ in length, plus the
/// one-sample failure modes on the differences.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::paired_t_test;
///
/// let before = [5.0, 6.0, 7.0, 8.0, 9.0];
/// let after  = [5.5, 6.2, 7.1, 8.3, 9.4];
/// let r = paired_t_test(&before, &after, &TestConfig::default()).unwrap();
/// assert!(r.statistic < 0.0); // after > before
/// ```
pub fn paired_t_test(x: &[f64], y: &[f64], cfg: &TestConfig) -> Result<TestResult> {
    if x.len() != y.len() {
        return Err(InferenceError::DimensionMismatch {
            what: "paired samples",
            expected: x.len(),
            actual: y.len(),
        });
    }
    let diffs: Vec<f64> = x.iter().zip(y).map(|(&a, &b)| a - b).collect();
    location_t_test(&diffs, 0.0, cfg, "paired t-test")
}

// ---------------------------------------------------------------------------
// ANOVA
// ---------------------------------------------------------------------------

/// Result of one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    /// F-statistic.
    pub f_statistic: f64,
    /// Degrees of freedom between groups (k − 1).
    pub df_between: usize,
    /// Degrees of freedom within groups (N − k).
    pub df_within: usize,
    /// p-value.
    pub p_value: f64,
    /// `p_value < alpha`.
    pub reject: bool,
    /// Sum of squares between groups.
    pub ss_between: f64,
    /// Sum of squares within groups.
    pub ss_within: f64,
    /// Mean square between.
    pub ms_between: f64,
    /// Mean square within.
    pub ms_within: f64,
    /// Group means.
    pub group_means: Vec<f64>,
    /// Grand mean.
    pub grand_mean: f64,
    /// SS_between / SS_total (0 when the data has no spread at all).
    pub eta_squared: f64,
}

impl AnovaResult {
    /// Eta-squared as a tagged [`EffectSize`].
    pub fn effect_size(&self) -> EffectSize {
        EffectSize::EtaSquared(self.eta_squared)
    }
}

/// One-way ANOVA: H₀: all group means are equal.
///
/// # Algorithm
///
/// F = MS_between / MS_within where
/// MS_between = SS_between / (k−1),
/// MS_within = SS_within / (N−k).
///
/// When every observation is identical both sums of squares vanish and the
/// result is F = 0, p = 1. When only the within-group spread vanishes,
/// F = ∞ and p = 0.
///
/// # Errors
///
/// `InsufficientData` for fewer than 2 groups or a group with fewer than
/// 2 observations; `InvalidInput` for non-finite values.
///
/// # References
///
/// Fisher (1925). "Statistical Methods for Research Workers".
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::one_way_anova;
///
/// let group1 = [5.0, 6.0, 7.0, 5.5, 6.5];
/// let group2 = [8.0, 9.0, 8.5, 9.5, 8.0];
/// let group3 = [4.0, 3.0, 3.5, 4.5, 4.0];
/// let r = one_way_anova(&[&group1, &group2, &group3], &TestConfig::default()).unwrap();
/// assert!(r.p_value < 0.01);
/// ```
pub fn one_way_anova(groups: &[&[f64]], cfg: &TestConfig) -> Result<AnovaResult> {
    cfg.validate()?;
    let k = groups.len();
    ensure_len("ANOVA groups", k, 2)?;
    for g in groups {
        ensure_len("ANOVA group observations", g.len(), 2)?;
        ensure_finite("ANOVA group", g)?;
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean = stats::mean(&all)?;

    let group_means = groups
        .iter()
        .map(|g| stats::mean(g))
        .collect::<Result<Vec<f64>>>()?;

    let ss_between: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
        .sum();

    let ss_within: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.iter().map(|&x| (x - gm).powi(2)).sum::<f64>())
        .sum();

    let df_between = k - 1;
    let df_within = total_n - k;

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    // A sum of squares no larger than n squared deviations of a few ULPs of
    // the data magnitude is rounding noise.
    let magnitude = all.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    let resolution = 8.0 * f64::EPSILON * magnitude;
    let noise = total_n as f64 * resolution * resolution;
    let between_zero = ss_between <= noise;
    let within_zero = ss_within <= noise;

    let (f_statistic, p_value) = match (between_zero, within_zero) {
        (true, true) => (0.0, 1.0),
        (false, true) => (f64::INFINITY, 0.0),
        _ => {
            let f = ms_between / ms_within;
            let dist = FisherF::new(df_between as f64, df_within as f64)?;
            (f, dist.sf(f))
        }
    };

    let ss_total = ss_between + ss_within;
    let eta_squared = if ss_total > noise { ss_between / ss_total } else { 0.0 };

    Ok(AnovaResult {
        f_statistic,
        df_between,
        df_within,
        p_value,
        reject: p_value < cfg.alpha,
        ss_between,
        ss_within,
        ms_between,
        ms_within,
        group_means,
        grand_mean,
        eta_squared,
    })
}

// ---------------------------------------------------------------------------
// Chi-squared tests
// ---------------------------------------------------------------------------

fn ensure_counts(what: &str, values: &[f64]) -> Result<()> {
    ensure_finite(what, values)?;
    if let Some(pos) = values.iter().position(|&v| v < 0.0) {
        return Err(InferenceError::InvalidInput(format!(
            "{what} has a negative count at index {pos}"
        )));
    }
    Ok(())
}

/// Chi-squared goodness-of-fit test: H₀: observed matches expected.
///
/// # Algorithm
///
/// χ² = Σ (Oᵢ − Eᵢ)² / Eᵢ, df = k − 1.
///
/// # Errors
///
/// `DimensionMismatch` when the slices differ in length, `InsufficientData`
/// for fewer than 2 categories, `InvalidInput` for a negative observed count
/// or a non-positive expected count.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::chi_squared_goodness_of_fit;
///
/// let observed = [50.0, 30.0, 20.0];
/// let expected = [40.0, 35.0, 25.0];
/// let r = chi_squared_goodness_of_fit(&observed, &expected, &TestConfig::default()).unwrap();
/// assert!(r.statistic > 0.0);
/// ```
pub fn chi_squared_goodness_of_fit(
    observed: &[f64],
    expected: &[f64],
    cfg: &TestConfig,
) -> Result<TestResult> {
    cfg.validate()?;
    if observed.len() != expected.len() {
        return Err(InferenceError::DimensionMismatch {
            what: "expected frequencies",
            expected: observed.len(),
            actual: expected.len(),
        });
    }
    ensure_len("goodness-of-fit categories", observed.len(), 2)?;
    ensure_counts("observed frequencies", observed)?;
    ensure_finite("expected frequencies", expected)?;
    if let Some(pos) = expected.iter().position(|&e| e <= 0.0) {
        return Err(InferenceError::InvalidInput(format!(
            "expected frequency at index {pos} must be positive"
        )));
    }

    let chi2: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| (o - e).powi(2) / e)
        .sum();
    let df = (observed.len() - 1) as f64;
    let p_value = ChiSquared::new(df)?.sf(chi2);

    Ok(TestResult::new(chi2, df, p_value, cfg))
}

/// Chi-squared test of independence for an r × c contingency table.
///
/// # Algorithm
///
/// Eᵢⱼ = Rᵢ · Cⱼ / N, χ² = Σ (Oᵢⱼ − Eᵢⱼ)² / Eᵢⱼ, df = (r−1)(c−1).
/// Cramér's V = √(χ² / (N · (min(r, c) − 1))).
///
/// The test is right-tailed; `cfg.alternative` does not apply.
///
/// # Errors
///
/// `InsufficientData` for fewer than 2 rows or columns, `DimensionMismatch`
/// for ragged rows, `InvalidInput` for negative counts or an empty row or
/// column.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::chi_squared_independence;
///
/// let table: [&[f64]; 2] = [&[10.0, 20.0], &[30.0, 40.0]];
/// let r = chi_squared_independence(&table, &TestConfig::default()).unwrap();
/// assert_eq!(r.df, 1.0);
/// ```
pub fn chi_squared_independence(table: &[&[f64]], cfg: &TestConfig) -> Result<TestResult> {
    cfg.validate()?;
    let n_rows = table.len();
    ensure_len("contingency table rows", n_rows, 2)?;
    let n_cols = table[0].len();
    ensure_len("contingency table columns", n_cols, 2)?;
    for row in table {
        if row.len() != n_cols {
            return Err(InferenceError::DimensionMismatch {
                what: "contingency table row",
                expected: n_cols,
                actual: row.len(),
            });
        }
        ensure_counts("contingency table", row)?;
    }

    let row_totals: Vec<f64> = table.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols)
        .map(|j| table.iter().map(|row| row[j]).sum())
        .collect();
    let grand_total: f64 = row_totals.iter().sum();

    if row_totals.iter().chain(&col_totals).any(|&t| t <= 0.0) {
        return Err(InferenceError::InvalidInput(
            "contingency table has an empty row or column".into(),
        ));
    }

    let mut chi2 = 0.0;
    for (row, &rt) in table.iter().zip(&row_totals) {
        for (&o, &ct) in row.iter().zip(&col_totals) {
            let e = rt * ct / grand_total;
            chi2 += (o - e).powi(2) / e;
        }
    }

    let df = ((n_rows - 1) * (n_cols - 1)) as f64;
    let p_value = ChiSquared::new(df)?.sf(chi2);
    let min_dim = n_rows.min(n_cols) as f64;
    let cramers_v = (chi2 / (grand_total * (min_dim - 1.0))).sqrt();

    Ok(TestResult::new(chi2, df, p_value, cfg).with_effect(EffectSize::CramersV(cramers_v)))
}

// ---------------------------------------------------------------------------
// Non-parametric tests
// ---------------------------------------------------------------------------

/// Mann-Whitney U test: H₀: the two populations have the same distribution.
///
/// # Algorithm
///
/// 1. Combine samples, rank all observations (average ranks for ties)
/// 2. U₁ = R₁ − n₁(n₁+1)/2 where R₁ = sum of ranks in sample `a`
/// 3. Normal approximation: z = (U₁ − μ) / σ
///    where μ = n₁n₂/2, σ² = n₁n₂/12 · (n+1 − Σ(t³−t)/(n(n−1)))
///
/// No exact small-sample distribution is used. The rank-biserial
/// correlation is 2U₁/(n₁n₂) − 1; positive values mean `a` tends larger.
///
/// # References
///
/// Mann & Whitney (1947). "On a test of whether one of two random
/// variables is stochastically larger than the other". Annals of
/// Mathematical Statistics, 18(1), 50–60.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::mann_whitney_u_test;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let r = mann_whitney_u_test(&a, &b, &TestConfig::default()).unwrap();
/// assert!(r.p_value < 0.05);
/// ```
pub fn mann_whitney_u_test(a: &[f64], b: &[f64], cfg: &TestConfig) -> Result<TestResult> {
    cfg.validate()?;
    ensure_len("Mann-Whitney (first sample)", a.len(), 2)?;
    ensure_len("Mann-Whitney (second sample)", b.len(), 2)?;
    ensure_finite("first sample", a)?;
    ensure_finite("second sample", b)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    // (value, is_first_sample)
    let mut combined: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    combined.sort_by(|x, y| x.0.total_cmp(&y.0));

    let sorted: Vec<f64> = combined.iter().map(|&(v, _)| v).collect();
    let ranks = stats::average_ranks(&sorted);

    let r1: f64 = combined
        .iter()
        .zip(&ranks)
        .filter(|((_, first), _)| *first)
        .map(|(_, &r)| r)
        .sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;

    let tie_correction = stats::tie_correction(&sorted);
    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * (n + 1.0 - tie_correction / (n * (n - 1.0)));
    if sigma_sq <= 0.0 {
        return Err(InferenceError::ZeroVariance("Mann-Whitney U test"));
    }

    let z = (u1 - mu) / sigma_sq.sqrt();
    let p_value = z_p_value(z, cfg.alternative);
    let rank_biserial = 2.0 * u1 / (n1 * n2) - 1.0;

    Ok(TestResult::new(u1, 0.0, p_value, cfg).with_effect(EffectSize::RankBiserial(rank_biserial)))
}

/// Two-sample Kolmogorov-Smirnov test: H₀: both samples come from the same
/// continuous distribution.
///
/// # Algorithm
///
/// D = max |F₁(x) − F₂(x)| over the union of observed values. The p-value
/// is Q_KS((√nₑ + 0.12 + 0.11/√nₑ) · D) with nₑ = n₁n₂/(n₁+n₂), where
/// Q_KS is the asymptotic Kolmogorov survival function. The test is
/// two-sided only.
///
/// # References
///
/// Stephens (1970). "Use of the Kolmogorov-Smirnov, Cramér-von Mises and
/// related statistics without extensive tables". JRSS B, 32(1), 115–122.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::ks_two_sample_test;
///
/// let a = [0.1, 0.4, 0.7, 1.0, 1.3, 1.6, 1.9, 2.2];
/// let b = [5.0, 5.3, 5.6, 5.9, 6.2, 6.5, 6.8, 7.1];
/// let r = ks_two_sample_test(&a, &b, &TestConfig::default()).unwrap();
/// assert_eq!(r.statistic, 1.0);
/// assert!(r.reject);
/// ```
pub fn ks_two_sample_test(a: &[f64], b: &[f64], cfg: &TestConfig) -> Result<TestResult> {
    cfg.validate()?;
    ensure_len("Kolmogorov-Smirnov (first sample)", a.len(), 2)?;
    ensure_len("Kolmogorov-Smirnov (second sample)", b.len(), 2)?;
    ensure_finite("first sample", a)?;
    ensure_finite("second sample", b)?;

    let mut xs = a.to_vec();
    let mut ys = b.to_vec();
    stats::sort_ascending(&mut xs);
    stats::sort_ascending(&mut ys);

    let n1 = xs.len();
    let n2 = ys.len();
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < n1 && j < n2 {
        // Advance past every copy of the smaller value in both samples.
        let x = xs[i].min(ys[j]);
        while i < n1 && xs[i] <= x {
            i += 1;
        }
        while j < n2 && ys[j] <= x {
            j += 1;
        }
        let gap = (i as f64 / n1 as f64 - j as f64 / n2 as f64).abs();
        d = d.max(gap);
    }

    let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    let p_value = kolmogorov_sf(lambda);

    Ok(TestResult::new(d, 0.0, p_value, cfg))
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation test: H₀: ρ = 0.
///
/// # Algorithm
///
/// t = r √((n−2)/(1−r²)), df = n − 2. The confidence interval for ρ uses
/// Fisher's z transform, tanh(atanh(r) ± z*/√(n−3)), and is reported only
/// when n > 3.
///
/// # Errors
///
/// `DimensionMismatch` when the slices differ in length,
/// `InsufficientData` for fewer than 3 pairs, `ZeroVariance` when either
/// variable is constant.
///
/// # Examples
///
/// ```
/// use u_inference::config::TestConfig;
/// use u_inference::testing::pearson_correlation_test;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let y = [2.1, 3.9, 6.2, 7.8, 10.1, 12.2];
/// let r = pearson_correlation_test(&x, &y, &TestConfig::default()).unwrap();
/// assert!(r.effect_size.unwrap().value() > 0.99);
/// ```
pub fn pearson_correlation_test(x: &[f64], y: &[f64], cfg: &TestConfig) -> Result<TestResult> {
    cfg.validate()?;
    if x.len() != y.len() {
        return Err(InferenceError::DimensionMismatch {
            what: "correlation pairs",
            expected: x.len(),
            actual: y.len(),
        });
    }
    ensure_len("correlation pairs", x.len(), 3)?;
    ensure_finite("x", x)?;
    ensure_finite("y", y)?;

    let n = x.len() as f64;
    let mx = stats::mean(x)?;
    let my = stats::mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return Err(InferenceError::ZeroVariance("Pearson correlation test"));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = n - 2.0;
    let dist = StudentT::new(df)?;
    let perfect = 1.0 - r * r <= f64::EPSILON;
    let (t, p_value) = if perfect {
        let t = r.signum() * f64::INFINITY;
        let p = match cfg.alternative {
            Alternative::TwoSided => 0.0,
            Alternative::Greater => if r > 0.0 { 0.0 } else { 1.0 },
            Alternative::Less => if r < 0.0 { 0.0 } else { 1.0 },
        };
        (t, p)
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        (t, t_p_value(t, &dist, cfg.alternative))
    };

    let mut result = TestResult::new(t, df, p_value, cfg).with_effect(EffectSize::PearsonR(r));
    if x.len() > 3 && !perfect {
        let z = r.atanh();
        let crit = Normal::standard().quantile(0.5 + cfg.confidence_level / 2.0)?;
        let half = crit / (n - 3.0).sqrt();
        result = result.with_interval(((z - half).tanh(), (z + half).tanh()));
    }
    Ok(result)
}
