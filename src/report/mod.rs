//! Reporting utilities: run interpretation and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::domain::{BridgeSummary, GaussianMarginal};

/// Ratio of |drift| to path volatility above which the drift is called strong.
pub const STRONG_DRIFT_RATIO: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriftDirection {
    Negative,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Regime {
    /// The drift field pulls toward the mean on average.
    Reverting,
    /// The drift field pushes away from the mean on average.
    Repelling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriftStrength {
    Strong,
    Moderate,
}

/// Plain-language reading of one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interpretation {
    /// Close-window mean is closer to zero than the open-window mean.
    pub mean_reversion: bool,
    /// Percentage change from open to close volatility.
    pub volatility_change_pct: f64,
    pub drift_direction: DriftDirection,
    pub regime: Regime,
    pub strength: DriftStrength,
}

/// Derive the interpretation from the endpoint marginals and the summary.
pub fn interpret(open: &GaussianMarginal, close: &GaussianMarginal, summary: &BridgeSummary) -> Interpretation {
    let open_std = open.std();
    let volatility_change_pct = if open_std > 0.0 {
        (close.std() - open_std) / open_std * 100.0
    } else {
        0.0
    };

    Interpretation {
        mean_reversion: close.mean.abs() < open.mean.abs(),
        volatility_change_pct,
        drift_direction: if summary.drift_coefficient < 0.0 {
            DriftDirection::Negative
        } else {
            DriftDirection::Positive
        },
        regime: if summary.reversion_strength > 0.0 {
            Regime::Reverting
        } else {
            Regime::Repelling
        },
        strength: if summary.drift_to_volatility > STRONG_DRIFT_RATIO {
            DriftStrength::Strong
        } else {
            DriftStrength::Moderate
        },
    }
}
