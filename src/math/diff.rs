//! Finite differences on a uniform grid.

/// Derivative estimate of `values` sampled with spacing `dt`.
///
/// Centered differences at interior points, one-sided (forward / backward)
/// differences at the two boundaries. Each entry only reads its neighbors, so
/// the result does not depend on evaluation order.
///
/// Returns an empty vector for fewer than two samples.
pub fn gradient(values: &[f64], dt: f64) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / dt);
    for i in 1..n - 1 {
        out.push((values[i + 1] - values[i - 1]) / (2.0 * dt));
    }
    out.push((values[n - 1] - values[n - 2]) / dt);
    out
}
