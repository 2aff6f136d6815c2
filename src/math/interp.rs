//! Interpolation helpers.

/// Linear interpolation between `a` (at `u = 0`) and `b` (at `u = 1`).
///
/// Exact at both ends and constant when `a == b`: the naive
/// `a + (b - a) * u` can miss `b` by an ulp at `u = 1`, which would break
/// boundary matching of the bridge.
pub fn lerp(a: f64, b: f64, u: f64) -> f64 {
    if a == b {
        return a;
    }
    if u < 0.5 {
        a + (b - a) * u
    } else {
        b - (b - a) * (1.0 - u)
    }
}

/// Piecewise-linear lookup of `ys` at `x`, given increasing knots `xs`.
///
/// Returns `None` when `x` is outside `[xs[0], xs[n-1]]` or the inputs are unusable.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() || !x.is_finite() {
        return None;
    }
    let first = xs[0];
    let last = xs[xs.len() - 1];
    if x < first || x > last {
        return None;
    }
    if xs.len() == 1 {
        return Some(ys[0]);
    }

    // Upper knot index: first xs[j] >= x.
    let j = xs.partition_point(|&v| v < x).max(1);
    let (x0, x1) = (xs[j - 1], xs[j]);
    let (y0, y1) = (ys[j - 1], ys[j]);
    if (x1 - x0).abs() < 1e-15 {
        return Some(y1);
    }
    Some(lerp(y0, y1, (x - x0) / (x1 - x0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_is_exact_at_ends() {
        let (a, b) = (-0.000017, 0.000003);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert!((lerp(a, b, 0.5) - (a + b) / 2.0).abs() < 1e-18);
    }

    #[test]
    fn lerp_constant_stays_constant() {
        for i in 0..=10 {
            assert_eq!(lerp(0.3, 0.3, i as f64 / 10.0), 0.3);
        }
    }

    #[test]
    fn interp_linear_between_knots() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 30.0];
        assert_eq!(interp_linear(&xs, &ys, 0.0), Some(0.0));
        assert!((interp_linear(&xs, &ys, 1.5).unwrap() - 20.0).abs() < 1e-12);
        assert_eq!(interp_linear(&xs, &ys, 2.0), Some(30.0));
        assert_eq!(interp_linear(&xs, &ys, 2.5), None);
        assert_eq!(interp_linear(&xs, &ys, -0.1), None);
    }
}
