//! Synthetic window samples for demos and offline runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{GaussianMarginal, WindowSamples};
use crate::error::AppError;

/// Parameters for a synthetic open/close sample.
///
/// Defaults reproduce the scale of four weeks of SPY 1-minute returns
/// (six bars per window per day).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub open: GaussianMarginal,
    pub close: GaussianMarginal,
    pub open_count: usize,
    pub close_count: usize,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            open: GaussianMarginal::from_std(-0.000017, 0.0016),
            close: GaussianMarginal::from_std(0.000003, 0.0010),
            open_count: 120,
            close_count: 120,
            seed: 42,
        }
    }
}

/// Draw i.i.d. Gaussian returns for both windows. Same spec, same samples.
pub fn generate_samples(spec: &SyntheticSpec) -> Result<WindowSamples, AppError> {
    if spec.open_count == 0 || spec.close_count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(spec));
    let open_dist = normal(&spec.open)?;
    let close_dist = normal(&spec.close)?;

    let open = (0..spec.open_count).map(|_| open_dist.sample(&mut rng)).collect();
    let close = (0..spec.close_count).map(|_| close_dist.sample(&mut rng)).collect();

    Ok(WindowSamples {
        open,
        close,
        session: Vec::new(),
    })
}

fn normal(m: &GaussianMarginal) -> Result<Normal<f64>, AppError> {
    if !(m.mean.is_finite() && m.variance.is_finite() && m.variance > 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid synthetic marginal: mean {}, variance {}.", m.mean, m.variance),
        ));
    }
    Normal::new(m.mean, m.std()).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))
}

fn sample_seed(spec: &SyntheticSpec) -> u64 {
    let mut hasher = DefaultHasher::new();
    spec.seed.hash(&mut hasher);
    spec.open.mean.to_bits().hash(&mut hasher);
    spec.open.variance.to_bits().hash(&mut hasher);
    spec.close.mean.to_bits().hash(&mut hasher);
    spec.close.variance.to_bits().hash(&mut hasher);
    spec.open_count.hash(&mut hasher);
    spec.close_count.hash(&mut hasher);
    hasher.finish()
}
