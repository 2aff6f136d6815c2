//! Gaussian marginal fitting from window return samples.

use crate::domain::{FittedMarginal, GaussianMarginal, Window};
use crate::error::AppError;
use crate::math::{mean, sample_variance};

/// Fit `N(mean, variance)` to the finite values of `sample`.
///
/// Uses the unbiased (n - 1) variance. Fewer than two finite observations is an
/// insufficient-data error; a zero spread is rejected because the bridge needs
/// strictly positive endpoint variances.
pub fn fit_marginal(window: Window, sample: &[f64]) -> Result<FittedMarginal, AppError> {
    let clean: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    let dropped = sample.len() - clean.len();
    if dropped > 0 {
        tracing::warn!(window = window.label(), dropped, "ignored non-finite returns");
    }

    if clean.len() < 2 {
        return Err(AppError::new(
            3,
            format!(
                "{} window has {} usable returns (need at least 2).",
                window.label(),
                clean.len()
            ),
        ));
    }

    let (Some(mu), Some(var)) = (mean(&clean), sample_variance(&clean)) else {
        return Err(AppError::new(3, format!("{} window is empty.", window.label())));
    };

    if !(var.is_finite() && var > 0.0) {
        return Err(AppError::new(
            4,
            format!("{} window variance must be > 0, got {var}", window.label()),
        ));
    }

    tracing::debug!(
        window = window.label(),
        n = clean.len(),
        mean = mu,
        std = var.sqrt(),
        "fitted marginal"
    );

    Ok(FittedMarginal {
        window,
        marginal: GaussianMarginal::new(mu, var),
        samples: Some(clean.len()),
    })
}
