//! Bridge core.
//!
//! Responsibilities:
//!
//! - build the Gaussian density path between the open and close marginals (`path`)
//! - derive the affine drift field from the Fokker-Planck equation (`drift`)
//! - reduce path + field to the reported scalars (`summary`)
//!
//! Every stage is a pure function of its inputs.

pub mod drift;
pub mod path;
pub mod summary;

pub use drift::extract;
pub use path::build;
pub use summary::{instantaneous_volatility, summarize};

use crate::domain::{BridgeConfig, BridgeSolution, GaussianMarginal};
use crate::error::BridgeError;

/// Run build → extract → summarize for one pair of marginals.
pub fn solve(
    m0: &GaussianMarginal,
    mt: &GaussianMarginal,
    cfg: &BridgeConfig,
) -> Result<BridgeSolution, BridgeError> {
    let path = build(m0, mt, cfg)?;
    let field = extract(&path, cfg.diffusion)?;
    let summary = summarize(&path, &field)?;

    tracing::debug!(
        steps = cfg.steps,
        horizon = cfg.horizon,
        diffusion = cfg.diffusion,
        coupling = cfg.coupling.label(),
        drift = summary.drift_coefficient,
        volatility = summary.volatility,
        reversion = summary.reversion_strength,
        "bridge solved"
    );

    Ok(BridgeSolution {
        config: *cfg,
        path,
        field,
        summary,
    })
}
