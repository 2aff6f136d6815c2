//! Time grid generation.
//!
//! The bridge is evaluated on `steps` evenly spaced points covering `[0, T]`.
//! Grid times are computed as `(i / (steps - 1)) * T` rather than by repeated
//! addition, so the last point is exactly `T` and no rounding error accumulates.

use crate::error::BridgeError;

/// Fraction of the horizon elapsed at grid index `i` (exactly `0.0` and `1.0` at the ends).
pub fn grid_fraction(i: usize, steps: usize) -> f64 {
    if steps < 2 {
        return 0.0;
    }
    i as f64 / (steps as f64 - 1.0)
}

/// Generate `steps` evenly spaced times on `[0, horizon]` (inclusive).
pub fn time_grid(horizon: f64, steps: usize) -> Result<Vec<f64>, BridgeError> {
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(BridgeError::config(format!(
            "horizon must be finite and > 0, got {horizon}"
        )));
    }
    if steps < 2 {
        return Err(BridgeError::config(format!("steps must be >= 2, got {steps}")));
    }

    Ok((0..steps).map(|i| grid_fraction(i, steps) * horizon).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_grid_includes_endpoints() {
        let v = time_grid(6.5, 14).unwrap();
        assert_eq!(v.len(), 14);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[13], 6.5);
    }

    #[test]
    fn time_grid_is_strictly_increasing() {
        let v = time_grid(1.0, 101).unwrap();
        for w in v.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn time_grid_rejects_bad_inputs() {
        assert!(time_grid(1.0, 1).is_err());
        assert!(time_grid(0.0, 10).is_err());
        assert!(time_grid(f64::NAN, 10).is_err());
    }
}
