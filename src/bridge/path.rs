//! Bridge path construction.
//!
//! With a Brownian reference of variance rate `σ²` and Gaussian endpoints
//! `N(m0, v0)`, `N(mT, vT)`, the entropy-minimizing bridge stays Gaussian at every
//! time. Writing `s = t / T` and `q = σ² T`:
//!
//! ```text
//! mean(t)     = m0 + (mT - m0) s
//! variance(t) = v0 (1-s)^2 + vT s^2 + 2 s (1-s) C + σ² t (1-s)
//! ```
//!
//! `C` is the covariance of `(X_0, X_T)` under the endpoint coupling:
//!
//! - entropic: `C = (sqrt(4 v0 vT + q^2) - q) / 2`
//! - independent: `C = 0` (plain Doob-bridge law)
//!
//! Numerical notes:
//! - Every variance term is non-negative, so the sum never cancels.
//! - `C` is evaluated as `g / ((sqrt(4 + (q/g)^2) + q/g) / 2)`, which avoids the
//!   subtraction `sqrt(..) - q` losing all digits when `q` dominates.
//! - `C` is scaled by `g = sqrt(v0) sqrt(vT)` so extreme variances neither
//!   underflow nor overflow the product `v0 vT`.
//! - The first and last grid points carry `v0` / `vT` verbatim.

use crate::domain::{BridgeConfig, BridgePath, BridgeState, CouplingLaw, GaussianMarginal};
use crate::error::BridgeError;
use crate::math::{grid_fraction, lerp, time_grid};

/// Build the bridge path between two Gaussian marginals.
///
/// Fails with `InvalidBridgeState` if an interior variance overflows.
pub fn build(
    m0: &GaussianMarginal,
    mt: &GaussianMarginal,
    cfg: &BridgeConfig,
) -> Result<BridgePath, BridgeError> {
    validate_inputs(m0, mt, cfg)?;

    let cross = coupling_covariance(m0.variance, mt.variance, cfg.diffusion * cfg.horizon, cfg.coupling);

    let last = cfg.steps - 1;
    let states: Vec<BridgeState> = time_grid(cfg.horizon, cfg.steps)?
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let s = grid_fraction(i, cfg.steps);
            let variance = match i {
                0 => m0.variance,
                i if i == last => mt.variance,
                _ => bridge_variance(m0.variance, mt.variance, cross, cfg.diffusion, t, s),
            };
            BridgeState {
                t,
                mean: lerp(m0.mean, mt.mean, s),
                variance,
            }
        })
        .collect();

    if let Some((index, st)) = states
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

    Ok(BridgePath::from_states(cfg.horizon, states))
}

/// Reject configurations before any computation starts.
pub fn validate_inputs(
    m0: &GaussianMarginal,
    mt: &GaussianMarginal,
    cfg: &BridgeConfig,
) -> Result<(), BridgeError> {
    if cfg.steps < 2 {
        return Err(BridgeError::config(format!("steps must be >= 2, got {}", cfg.steps)));
    }
    if !(cfg.horizon.is_finite() && cfg.horizon > 0.0) {
        return Err(BridgeError::config(format!(
            "horizon must be finite and > 0, got {}",
            cfg.horizon
        )));
    }
    if !(cfg.diffusion.is_finite() && cfg.diffusion >= 0.0) {
        return Err(BridgeError::config(format!(
            "diffusion must be finite and >= 0, got {}",
            cfg.diffusion
        )));
    }
    for (label, m) in [("open", m0), ("close", mt)] {
        if !m.mean.is_finite() {
            return Err(BridgeError::config(format!("{label} mean must be finite, got {}", m.mean)));
        }
        if !(m.variance.is_finite() && m.variance > 0.0) {
            return Err(BridgeError::config(format!(
                "{label} variance must be finite and > 0, got {}",
                m.variance
            )));
        }
    }
    Ok(())
}

/// Endpoint covariance `C` for the chosen coupling.
///
/// `q` is the reference variance accumulated over the whole horizon (`σ² T`).
pub fn coupling_covariance(v0: f64, vt: f64, q: f64, coupling: CouplingLaw) -> f64 {
    match coupling {
        CouplingLaw::Independent => 0.0,
        CouplingLaw::Entropic => {
            // Scaled by the geometric mean so `v0 * vt` never under/overflows.
            let g = v0.sqrt() * vt.sqrt();
            let r = q / g;
            if !r.is_finite() {
                return 0.0;
            }
            g / (0.5 * ((4.0 + r * r).sqrt() + r))
        }
    }
}

/// Variance at time `t` (`s = t / T`), given the endpoint covariance `cross`.
pub fn bridge_variance(v0: f64, vt: f64, cross: f64, diffusion: f64, t: f64, s: f64) -> f64 {
    let r = 1.0 - s;
    v0 * r * r + vt * s * s + 2.0 * s * r * cross + diffusion * t * r
}
