//! Tolerance-based floating-point comparisons.
//!
//! Window boundaries are reached by accumulating solver-chosen time steps,
//! so exact equality is never available. All boundary tests in the scheme
//! go through these helpers with a shared absolute tolerance.

/// Absolute tolerance for time comparisons.
pub const NUMERICAL_ZERO_DIFFERENCE: f64 = 1.0e-14;

/// `a == b` within [`NUMERICAL_ZERO_DIFFERENCE`].
pub fn equals(a: f64, b: f64) -> bool {
    (a - b).abs() <= NUMERICAL_ZERO_DIFFERENCE
}

/// `a > b` by more than the tolerance.
pub fn greater(a: f64, b: f64) -> bool {
    a - b > NUMERICAL_ZERO_DIFFERENCE
}

/// `a >= b` within the tolerance.
pub fn greater_equals(a: f64, b: f64) -> bool {
    a - b >= -NUMERICAL_ZERO_DIFFERENCE
}

/// `a < b` by more than the tolerance.
pub fn smaller(a: f64, b: f64) -> bool {
    b - a > NUMERICAL_ZERO_DIFFERENCE
}
