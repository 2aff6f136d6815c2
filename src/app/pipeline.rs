//! Shared "bridge pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! window samples -> marginals -> diffusion -> bridge solve -> interpretation
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::bridge::solve;
use crate::config::{AppConfig, horizon_in};
use crate::data::{DiffusionEstimate, SessionClock, estimate_diffusion, fit_marginal};
use crate::domain::{BridgeConfig, BridgeSolution, CouplingLaw, FittedMarginal, Window, WindowSamples};
use crate::error::AppError;
use crate::report::{Interpretation, interpret};

/// Resolved settings for one bridge run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeSettings {
    pub horizon: f64,
    pub steps: usize,
    /// Fixed `σ²`, also the fallback when estimation is not possible.
    pub diffusion: f64,
    pub estimate_diffusion: bool,
    pub coupling: CouplingLaw,
    pub clock: SessionClock,
    pub interval_minutes: f64,
}

impl BridgeSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let clock = config.session_clock()?;
        Ok(Self {
            horizon: horizon_in(config.bridge.horizon, &clock),
            steps: config.bridge.time_steps,
            diffusion: config.bridge.diffusion,
            estimate_diffusion: config.bridge.estimate_diffusion,
            coupling: config.bridge.coupling,
            clock,
            interval_minutes: config.interval_minutes()?,
        })
    }

    pub fn bridge_config(&self, diffusion: f64) -> BridgeConfig {
        BridgeConfig::new(self.horizon, self.steps, diffusion).with_coupling(self.coupling)
    }
}

/// Where the `σ²` used for the run came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffusionSource {
    Fixed,
    Estimated(DiffusionEstimate),
    /// Estimation was requested but failed; the fixed value was used.
    Fallback,
}

/// All computed outputs of a single bridge run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ticker: Option<String>,
    pub open: FittedMarginal,
    pub close: FittedMarginal,
    pub solution: BridgeSolution,
    pub interpretation: Interpretation,
    pub diffusion_source: DiffusionSource,
}

/// Fit both marginals from window samples and solve the bridge.
pub fn run_from_samples(
    samples: &WindowSamples,
    settings: &BridgeSettings,
    ticker: Option<&str>,
) -> Result<RunOutput, AppError> {
    // 1) Endpoint marginals.
    let open = fit_marginal(Window::Open, &samples.open)?;
    let close = fit_marginal(Window::Close, &samples.close)?;

    // 2) Reference diffusion.
    let (diffusion, source) = resolve_diffusion(samples, settings);

    // 3) Bridge.
    finish(open, close, settings, diffusion, source, ticker)
}

/// Solve the bridge for marginals supplied directly.
pub fn run_from_marginals(
    open: FittedMarginal,
    close: FittedMarginal,
    settings: &BridgeSettings,
    ticker: Option<&str>,
) -> Result<RunOutput, AppError> {
    finish(open, close, settings, settings.diffusion, DiffusionSource::Fixed, ticker)
}

fn resolve_diffusion(samples: &WindowSamples, settings: &BridgeSettings) -> (f64, DiffusionSource) {
    if !settings.estimate_diffusion {
        return (settings.diffusion, DiffusionSource::Fixed);
    }
    match estimate_diffusion(
        &samples.session,
        &settings.clock,
        settings.interval_minutes,
        settings.horizon,
    ) {
        Ok(est) => (est.diffusion, DiffusionSource::Estimated(est)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                fallback = settings.diffusion,
                "diffusion estimate unavailable, using fixed value"
            );
            (settings.diffusion, DiffusionSource::Fallback)
        }
    }
}

fn finish(
    open: FittedMarginal,
    close: FittedMarginal,
    settings: &BridgeSettings,
    diffusion: f64,
    diffusion_source: DiffusionSource,
    ticker: Option<&str>,
) -> Result<RunOutput, AppError> {
    let cfg = settings.bridge_config(diffusion);
    let solution = solve(&open.marginal, &close.marginal, &cfg)?;
    let interpretation = interpret(&open.marginal, &close.marginal, &solution.summary);

    tracing::info!(
        drift = solution.summary.drift_coefficient,
        volatility = solution.summary.volatility,
        reversion = solution.summary.reversion_strength,
        "bridge computed"
    );

    Ok(RunOutput {
        ticker: ticker.map(str::to_string),
        open,
        close,
        solution,
        interpretation,
        diffusion_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticSpec, generate_samples};
    use crate::domain::{GaussianMarginal, TimedReturn};
    use crate::report::format_run_summary;
    use chrono::{Duration, NaiveDate};

    fn settings() -> BridgeSettings {
        BridgeSettings::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn default_settings() {
        let s = settings();
        assert_eq!(s.horizon, 1.0);
        assert_eq!(s.steps, 100);
        assert_eq!(s.diffusion, 0.0);
        assert_eq!(s.interval_minutes, 1.0);
        assert_eq!(s.coupling, CouplingLaw::Entropic);
    }

    #[test]
    fn synthetic_run_end_to_end() {
        let samples = generate_samples(&SyntheticSpec::default()).unwrap();
        let out = run_from_samples(&samples, &settings(), Some("SPY")).unwrap();

        assert_eq!(out.open.samples, Some(120));
        assert_eq!(out.diffusion_source, DiffusionSource::Fixed);
        assert_eq!(out.solution.path.len(), 100);
        let first = out.solution.path.first().unwrap();
        assert_eq!(first.mean, out.open.marginal.mean);
        assert_eq!(first.variance, out.open.marginal.variance);

        let text = format_run_summary(&out);
        assert!(text.contains("Ticker: SPY"));
        assert!(text.contains("Bridge parameters:"));
        assert!(text.contains("(fixed)"));
    }

    #[test]
    fn missing_session_falls_back_to_fixed_diffusion() {
        let samples = generate_samples(&SyntheticSpec::default()).unwrap();
        let s = BridgeSettings {
            estimate_diffusion: true,
            diffusion: 1e-7,
            ..settings()
        };
        let out = run_from_samples(&samples, &s, None).unwrap();
        assert_eq!(out.diffusion_source, DiffusionSource::Fallback);
        assert_eq!(out.solution.config.diffusion, 1e-7);
    }

    #[test]
    fn session_returns_drive_estimated_diffusion() {
        let mut samples = generate_samples(&SyntheticSpec::default()).unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(9, 31, 0)
            .unwrap();
        samples.session = (0..200)
            .map(|i| TimedReturn {
                timestamp: start + Duration::minutes(i),
                value: if i % 2 == 0 { 0.0005 } else { -0.0005 },
            })
            .collect();
        let s = BridgeSettings {
            estimate_diffusion: true,
            ..settings()
        };
        let out = run_from_samples(&samples, &s, None).unwrap();
        match out.diffusion_source {
            DiffusionSource::Estimated(est) => {
                assert_eq!(est.samples, 200);
                assert!(out.solution.config.diffusion > 0.0);
                assert_eq!(out.solution.config.diffusion, est.diffusion);
            }
            other => panic!("expected estimated diffusion, got {other:?}"),
        }
    }

    #[test]
    fn empty_window_is_insufficient_data() {
        let samples = WindowSamples {
            open: vec![],
            close: vec![0.1, 0.2],
            session: vec![],
        };
        let err = run_from_samples(&samples, &settings(), None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn direct_marginals() {
        let open = FittedMarginal {
            window: Window::Open,
            marginal: GaussianMarginal::from_std(-0.0001, 0.002),
            samples: None,
        };
        let close = FittedMarginal {
            window: Window::Close,
            marginal: GaussianMarginal::from_std(0.0, 0.001),
            samples: None,
        };
        let out = run_from_marginals(open, close, &settings(), None).unwrap();
        assert!(out.solution.summary.reversion_strength > 0.0);
        assert!(format_run_summary(&out).contains("n=-"));
    }
}
