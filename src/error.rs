//! Error types.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Validation
//! failures are raised at the API boundary and never replaced by default
//! values. Approximation shortfalls of iterative solvers are not errors;
//! they are reported through [`Convergence`](crate::config::Convergence)
//! on the returned model.

/// Error raised by inference routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// A sample or group is smaller than the documented minimum.
    #[error("insufficient data for {what}: need at least {required}, got {actual}")]
    InsufficientData {
        /// What was being counted (observations, groups, events, ...).
        what: &'static str,
        /// Minimum required count.
        required: usize,
        /// Count actually supplied.
        actual: usize,
    },

    /// Paired or covariate arrays have inconsistent lengths.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which argument was inconsistent.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Gaussian elimination met a (near-)zero pivot after row exchange.
    #[error("singular matrix: pivot {pivot:e} in column {column}")]
    SingularMatrix {
        /// Column being eliminated.
        column: usize,
        /// Largest available pivot magnitude.
        pivot: f64,
    },

    /// A statistic would divide by a zero standard error.
    #[error("zero variance in {0}")]
    ZeroVariance(&'static str),

    /// A parameter is outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input data is malformed (non-finite values, negative counts, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Fails with `InsufficientData` when `actual < required`.
pub(crate) fn ensure_len(what: &'static str, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(InferenceError::InsufficientData {
            what,
            required,
            actual,
        });
    }
    Ok(())
}

/// Fails with `InvalidInput` when any value is NaN or infinite.
pub(crate) fn ensure_finite(what: &str, data: &[f64]) -> Result<()> {
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(InferenceError::InvalidInput(format!(
            "{what} contains a non-finite value at index {pos}"
        )));
    }
    Ok(())
}

/// Fails with `InvalidParameter` unless `0 < p < 1`.
pub(crate) fn ensure_probability(name: &str, p: f64) -> Result<()> {
    if !p.is_finite() || p <= 0.0 || p >= 1.0 {
        return Err(InferenceError::InvalidParameter(format!(
            "{name} must be in (0, 1), got {p}"
        )));
    }
    Ok(())
}
