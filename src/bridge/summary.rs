//! Reduce a bridge path and its drift field to the reported scalars.

use crate::domain::{BridgePath, BridgeSummary, DriftField};
use crate::error::BridgeError;
use crate::math::interp_linear;

/// Aggregate `path` and `field` into a [`BridgeSummary`].
pub fn summarize(path: &BridgePath, field: &DriftField) -> Result<BridgeSummary, BridgeError> {
    if path.is_empty() {
        return Err(BridgeError::config("cannot summarize an empty bridge path"));
    }
    if path.len() != field.len() {
        return Err(BridgeError::config(format!(
            "drift field length {} does not match path length {}",
            field.len(),
            path.len()
        )));
    }

    let n = path.len() as f64;
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return Err(BridgeError::config("cannot summarize an empty bridge path"));
    };

    let open_mean = first.mean;
    let close_mean = last.mean;

    let realized_drift_sum: f64 = path
        .iter()
        .zip(field.iter())
        .map(|(st, p)| p.drift_at(st.mean))
        .sum();
    let drift_coefficient = realized_drift_sum / n;

    let mean_variance = path.iter().map(|st| st.variance).sum::<f64>() / n;
    let volatility = mean_variance.max(0.0).sqrt();

    let mean_kappa = field.iter().map(|p| p.reversion_coefficient).sum::<f64>() / n;
    let reversion_strength = -mean_kappa;

    let drift_to_volatility = if volatility > 0.0 {
        drift_coefficient.abs() / volatility
    } else {
        0.0
    };

    Ok(BridgeSummary {
        open_mean,
        close_mean,
        mean_shift: close_mean - open_mean,
        drift_coefficient,
        volatility,
        reversion_strength,
        open_volatility: first.std(),
        close_volatility: last.std(),
        drift_to_volatility,
    })
}

/// Volatility `sqrt(variance(t))` at an arbitrary time in `[0, T]`.
///
/// Grid variances are interpolated linearly; `None` outside the horizon.
pub fn instantaneous_volatility(path: &BridgePath, t: f64) -> Option<f64> {
    let variance = interp_linear(&path.times(), &path.variances(), t)?;
    if variance.is_finite() && variance >= 0.0 {
        Some(variance.sqrt())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{drift::extract, path::build};
    use crate::domain::{BridgeConfig, BridgeState, DriftPoint, GaussianMarginal};

    #[test]
    fn summary_scalars_from_hand_built_inputs() {
        let path = BridgePath::from_states(
            1.0,
            vec![
                BridgeState { t: 0.0, mean: 1.0, variance: 4.0 },
                BridgeState { t: 1.0, mean: 3.0, variance: 16.0 },
            ],
        );
        let field = DriftField::from_points(vec![
            DriftPoint { t: 0.0, drift_intercept: 1.0, reversion_coefficient: -1.0 },
            DriftPoint { t: 1.0, drift_intercept: 2.0, reversion_coefficient: -3.0 },
        ]);
        let s = summarize(&path, &field).unwrap();
        assert_eq!(s.open_mean, 1.0);
        assert_eq!(s.close_mean, 3.0);
        assert_eq!(s.mean_shift, 2.0);
        // b(mean) = 1 - 1*1 = 0 and 2 - 3*3 = -7
        assert!((s.drift_coefficient + 3.5).abs() < 1e-12);
        assert!((s.volatility - 10.0_f64.sqrt()).abs() < 1e-12);
        assert!((s.reversion_strength - 2.0).abs() < 1e-12);
        assert_eq!(s.open_volatility, 2.0);
        assert_eq!(s.close_volatility, 4.0);
        assert!((s.drift_to_volatility - 3.5 / 10.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let path = BridgePath::from_states(
            1.0,
            vec![
                BridgeState { t: 0.0, mean: 0.0, variance: 1.0 },
                BridgeState { t: 1.0, mean: 0.0, variance: 1.0 },
            ],
        );
        let field = DriftField::from_points(vec![DriftPoint {
            t: 0.0,
            drift_intercept: 0.0,
            reversion_coefficient: 0.0,
        }]);
        assert!(matches!(
            summarize(&path, &field),
            Err(BridgeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn degenerate_bridge_has_no_drift_or_reversion() {
        let m = GaussianMarginal::from_std(0.0004, 0.0012);
        let cfg = BridgeConfig::new(1.0, 64, 0.0);
        let path = build(&m, &m, &cfg).unwrap();
        for st in path.iter() {
            assert_eq!(st.mean, m.mean);
            assert!((st.variance - m.variance).abs() < 1e-18);
        }
        let field = extract(&path, 0.0).unwrap();
        let s = summarize(&path, &field).unwrap();
        assert!(s.drift_coefficient.abs() < 1e-12);
        assert!(s.reversion_strength.abs() < 1e-9);
        assert_eq!(s.mean_shift, 0.0);
    }

    #[test]
    fn reference_sample_signs_and_ratio() {
        // Open/close figures from the SPY 1-minute sample the project was built on.
        let open = GaussianMarginal::from_std(-0.000017, 0.0016);
        let close = GaussianMarginal::from_std(0.000003, 0.0010);
        let cfg = BridgeConfig::new(1.0, 100, 0.0);
        let path = build(&open, &close, &cfg).unwrap();
        let field = extract(&path, 0.0).unwrap();
        let s = summarize(&path, &field).unwrap();

        assert!((s.mean_shift - 0.000020).abs() < 1e-12);
        assert!((s.drift_coefficient - 0.000020).abs() < 1e-12);
        assert!(s.reversion_strength > 0.0);
        // Drift per unit of path spread.
        assert!(s.drift_to_volatility > 0.012 && s.drift_to_volatility < 0.018);
    }

    #[test]
    fn instantaneous_volatility_at_endpoints_and_between() {
        let open = GaussianMarginal::from_std(0.0, 0.002);
        let close = GaussianMarginal::from_std(0.0, 0.001);
        let path = build(&open, &close, &BridgeConfig::new(6.5, 14, 0.0)).unwrap();
        assert!((instantaneous_volatility(&path, 0.0).unwrap() - 0.002).abs() < 1e-15);
        assert!((instantaneous_volatility(&path, 6.5).unwrap() - 0.001).abs() < 1e-15);
        let mid = instantaneous_volatility(&path, 3.25).unwrap();
        assert!(mid < 0.002 && mid > 0.001);
        assert_eq!(instantaneous_volatility(&path, 7.0), None);
    }
}
