//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value between pipeline stages
//! - exported to JSON/CSV
//! - reloaded later for plotting

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which clock window a return sample was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Open,
    Close,
}

impl Window {
    pub fn label(self) -> &'static str {
        match self {
            Window::Open => "open",
            Window::Close => "close",
        }
    }
}

/// Gaussian approximation of a return distribution at one endpoint in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianMarginal {
    pub mean: f64,
    pub variance: f64,
}

impl GaussianMarginal {
    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    /// Build from a mean and a standard deviation.
    pub fn from_std(mean: f64, std: f64) -> Self {
        Self {
            mean,
            variance: std * std,
        }
    }

    pub fn std(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// A marginal together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedMarginal {
    pub window: Window,
    pub marginal: GaussianMarginal,
    /// Sample size the marginal was fitted from (`None` when supplied directly).
    pub samples: Option<usize>,
}

/// How the endpoint values are coupled inside the bridge.
///
/// The coupling only changes the cross-covariance term of the variance law;
/// the mean path is linear either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CouplingLaw {
    /// Entropy-optimal coupling of the two Gaussians (closed-form Schrödinger bridge).
    #[default]
    Entropic,
    /// Independent endpoints: the plain Doob-bridge variance law.
    Independent,
}

impl CouplingLaw {
    pub fn label(self) -> &'static str {
        match self {
            CouplingLaw::Entropic => "entropic",
            CouplingLaw::Independent => "independent",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CouplingLaw::Entropic => CouplingLaw::Independent,
            CouplingLaw::Independent => CouplingLaw::Entropic,
        }
    }
}

/// Configuration for one bridge computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Time between the two marginals (`T > 0`).
    pub horizon: f64,
    /// Number of grid points including both endpoints (`>= 2`).
    pub steps: usize,
    /// Variance rate `σ²` of the reference Brownian motion (`>= 0`).
    pub diffusion: f64,
    #[serde(default)]
    pub coupling: CouplingLaw,
}

impl BridgeConfig {
    pub fn new(horizon: f64, steps: usize, diffusion: f64) -> Self {
        Self {
            horizon,
            steps,
            diffusion,
            coupling: CouplingLaw::Entropic,
        }
    }

    pub fn with_coupling(mut self, coupling: CouplingLaw) -> Self {
        self.coupling = coupling;
        self
    }
}

/// Gaussian density at one grid time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeState {
    pub t: f64,
    pub mean: f64,
    pub variance: f64,
}

impl BridgeState {
    pub fn std(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// Time-indexed sequence of Gaussian densities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgePath {
    horizon: f64,
    states: Vec<BridgeState>,
}

impl BridgePath {
    /// Assemble a path from already-computed states.
    ///
    /// Only the shape is taken on trust here; drift extraction re-checks
    /// variance positivity for every state.
    pub fn from_states(horizon: f64, states: Vec<BridgeState>) -> Self {
        Self { horizon, states }
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn states(&self) -> &[BridgeState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&BridgeState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&BridgeState> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BridgeState> {
        self.states.iter()
    }

    pub fn times(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.t).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.mean).collect()
    }

    pub fn variances(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.variance).collect()
    }
}

/// Local affine drift `b(x, t) = drift_intercept + reversion_coefficient * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftPoint {
    pub t: f64,
    pub drift_intercept: f64,
    /// Negative values pull toward the current mean.
    pub reversion_coefficient: f64,
}

impl DriftPoint {
    pub fn drift_at(&self, x: f64) -> f64 {
        self.drift_intercept + self.reversion_coefficient * x
    }
}

/// Drift field aligned 1:1 with a [`BridgePath`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftField {
    points: Vec<DriftPoint>,
}

impl DriftField {
    pub fn from_points(points: Vec<DriftPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[DriftPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DriftPoint> {
        self.points.iter()
    }
}

/// Scalar statistics reported for one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeSummary {
    pub open_mean: f64,
    pub close_mean: f64,
    pub mean_shift: f64,
    /// Time-average of the realized drift `b(mean(t), t)` along the path.
    pub drift_coefficient: f64,
    /// Root-mean-square spread along the path.
    pub volatility: f64,
    /// Negated mean reversion coefficient (positive = reverting).
    pub reversion_strength: f64,
    pub open_volatility: f64,
    pub close_volatility: f64,
    /// `|drift_coefficient| / volatility`.
    pub drift_to_volatility: f64,
}

/// Everything produced by one pass through the bridge core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSolution {
    pub config: BridgeConfig,
    pub path: BridgePath,
    pub field: DriftField,
    pub summary: BridgeSummary,
}

/// One intraday price bar (exchange-local timestamp).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// One-period log return stamped with the bar it ends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedReturn {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Return samples for the two clock windows plus the full session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSamples {
    pub open: Vec<f64>,
    pub close: Vec<f64>,
    /// All market-hours returns (used for diffusion estimation).
    pub session: Vec<TimedReturn>,
}

/// A saved bridge file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub ticker: Option<String>,
    pub open: FittedMarginal,
    pub close: FittedMarginal,
    pub config: BridgeConfig,
    pub summary: BridgeSummary,
    pub path: Vec<BridgeState>,
    pub field: Vec<DriftPoint>,
}

impl BridgeFile {
    pub fn bridge_path(&self) -> BridgePath {
        BridgePath::from_states(self.config.horizon, self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_point_is_affine_in_x() {
        let p = DriftPoint {
            t: 0.0,
            drift_intercept: 0.5,
            reversion_coefficient: -2.0,
        };
        assert!((p.drift_at(0.0) - 0.5).abs() < 1e-15);
        assert!((p.drift_at(1.0) + 1.5).abs() < 1e-15);
    }

    #[test]
    fn config_defaults_to_entropic_coupling() {
        let cfg = BridgeConfig::new(2.0, 5, 0.0);
        assert_eq!(cfg.steps, 5);
        assert_eq!(cfg.coupling, CouplingLaw::Entropic);
    }

    #[test]
    fn coupling_serializes_lowercase() {
        let json = serde_json::to_string(&CouplingLaw::Independent).unwrap();
        assert_eq!(json, "\"independent\"");
    }
}
