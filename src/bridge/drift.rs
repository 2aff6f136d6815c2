//! Drift field extraction from a Gaussian density path.
//!
//! Substituting `p(x, t) = N(mean(t), variance(t))` into
//!
//! ```text
//! ∂p/∂t = -∂(b p)/∂x + (σ²/2) ∂²p/∂x²
//! ```
//!
//! with an affine drift `b(x, t) = α(t) + κ(t) x` and matching powers of `x`
//! gives the moment equations `mean' = α + κ mean` and `variance' = 2 κ variance + σ²`,
//! hence
//!
//! ```text
//! κ(t) = (variance'(t) - σ²) / (2 variance(t))
//! α(t) = mean'(t) - κ(t) mean(t)
//! ```
//!
//! `κ < 0` pulls values back toward the current mean.

use rayon::prelude::*;

use crate::domain::{BridgePath, DriftField, DriftPoint};
use crate::error::BridgeError;
use crate::math::gradient;

/// Evaluate the affine drift field implied by `path` under diffusion `σ²`.
pub fn extract(path: &BridgePath, diffusion: f64) -> Result<DriftField, BridgeError> {
    if !(diffusion.is_finite() && diffusion >= 0.0) {
        return Err(BridgeError::config(format!(
            "diffusion must be finite and >= 0, got {diffusion}"
        )));
    }
    let n = path.len();
    if n < 2 {
        return Err(BridgeError::config(format!(
            "bridge path needs at least 2 states, got {n}"
        )));
    }
    let horizon = path.horizon();
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(BridgeError::config(format!(
            "path horizon must be finite and > 0, got {horizon}"
        )));
    }

    // Sequential scan so the reported index is always the first bad one.
    if let Some((index, st)) = path
        .iter()
        .enumerate()
        .find(|(_, st)| !(st.variance.is_finite() && st.variance > 0.0))
    {
        return Err(BridgeError::InvalidBridgeState {
            index,
            t: st.t,
            variance: st.variance,
        });
    }

    let dt = horizon / (n as f64 - 1.0);
    let states = path.states();
    let mean_rate = gradient(&path.means(), dt);
    let var_rate = gradient(&path.variances(), dt);

    let points: Vec<DriftPoint> = (0..n)
        .into_par_iter()
        .map(|i| {
            let st = &states[i];
            let (alpha, kappa) = affine_drift(st.mean, st.variance, mean_rate[i], var_rate[i], diffusion);
            DriftPoint {
                t: st.t,
                drift_intercept: alpha,
                reversion_coefficient: kappa,
            }
        })
        .collect();

    tracing::debug!(
        steps = n,
        dt,
        diffusion,
        "extracted drift field"
    );

    Ok(DriftField::from_points(points))
}

/// `(α, κ)` for a single grid point.
///
/// Callers must guarantee `variance > 0`.
pub fn affine_drift(mean: f64, variance: f64, mean_rate: f64, var_rate: f64, diffusion: f64) -> (f64, f64) {
    let kappa = (var_rate - diffusion) / (2.0 * variance);
    let alpha = mean_rate - kappa * mean;
    (alpha, kappa)
}
