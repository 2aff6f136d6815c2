//! Reference diffusion estimate from session returns.
//!
//! Session returns are detrended against elapsed session time, and the residual
//! per-bar variance is scaled up to a variance rate over the bridge horizon:
//!
//! ```text
//! r_i = β0 + β1 u_i + ε_i          (u = fraction of session elapsed)
//! s²  = Σ ε_i² / (n - 2)
//! σ²  = s² · bars_per_session / T
//! ```

use nalgebra::{DMatrix, DVector};

use crate::data::returns::SessionClock;
use crate::domain::TimedReturn;
use crate::error::AppError;
use crate::math::solve_least_squares;

/// Result of a diffusion estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionEstimate {
    /// Variance rate `σ²` per unit of horizon.
    pub diffusion: f64,
    /// Residual per-bar variance `s²`.
    pub residual_variance: f64,
    pub samples: usize,
}

pub fn estimate_diffusion(
    session: &[TimedReturn],
    clock: &SessionClock,
    interval_minutes: f64,
    horizon: f64,
) -> Result<DiffusionEstimate, AppError> {
    let obs: Vec<(f64, f64)> = session
        .iter()
        .filter(|r| r.value.is_finite())
        .map(|r| (clock.session_fraction(r.timestamp), r.value))
        .collect();
    let n = obs.len();
    if n < 3 {
        return Err(AppError::new(
            3,
            format!("Diffusion estimate needs at least 3 session returns, got {n}."),
        ));
    }
    if !(interval_minutes.is_finite() && interval_minutes > 0.0) {
        return Err(AppError::new(2, "Bar interval must be > 0 minutes."));
    }
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(AppError::new(2, "Horizon must be > 0."));
    }

    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { obs[i].0 });
    let y = DVector::from_iterator(n, obs.iter().map(|(_, r)| *r));

    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| AppError::new(4, "Least squares failed while detrending session returns."))?;

    let fitted = &x * &beta;
    let ss: f64 = y.iter().zip(fitted.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    let residual_variance = ss / (n as f64 - 2.0);

    let bars_per_session = clock.session_minutes() / interval_minutes;
    let diffusion = residual_variance * bars_per_session / horizon;

    if !(diffusion.is_finite() && diffusion >= 0.0) {
        return Err(AppError::new(4, format!("Invalid diffusion estimate {diffusion}.")));
    }

    tracing::info!(
        samples = n,
        residual_variance,
        bars_per_session,
        diffusion,
        "estimated reference diffusion"
    );

    Ok(DiffusionEstimate {
        diffusion,
        residual_variance,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn clock() -> SessionClock {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        SessionClock::new(t(9, 30), t(9, 35), t(15, 55), t(16, 0)).unwrap()
    }

    #[test]
    fn recovers_known_per_bar_variance() {
        // +a, -a, -a, +a repeated is orthogonal to both the constant and any evenly
        // spaced time column, so the residuals are exactly the pattern.
        let a = 0.0008;
        let start = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(9, 33, 0)
            .unwrap();
        let pattern = [a, -a, -a, a];
        let session: Vec<TimedReturn> = (0..388)
            .map(|i| TimedReturn {
                timestamp: start + Duration::minutes(i as i64),
                value: 0.0005 + pattern[i % 4],
            })
            .collect();

        let est = estimate_diffusion(&session, &clock(), 1.0, 1.0).unwrap();
        let expected_s2 = 388.0 * a * a / 386.0;
        assert_eq!(est.samples, 388);
        assert!((est.residual_variance - expected_s2).abs() < 1e-15);
        assert!((est.diffusion - expected_s2 * 390.0).abs() < 1e-12);

        // Hours horizon and 5-minute bars rescale the rate.
        let est = estimate_diffusion(&session, &clock(), 5.0, 6.5).unwrap();
        assert!((est.diffusion - expected_s2 * 78.0 / 6.5).abs() < 1e-12);
    }

    #[test]
    fn too_few_returns() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let session = vec![TimedReturn { timestamp: ts, value: 0.001 }; 2];
        let err = estimate_diffusion(&session, &clock(), 1.0, 1.0).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
