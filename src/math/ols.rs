//! Least squares solver.
//!
//! Used to detrend intraday session returns before measuring their residual
//! variance (see `data::diffusion`):
//!
//! ```text
//! minimize Σ (r_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles the tall design matrix (many bars, two columns) directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Sessions with very few bars can make the time column nearly constant, so
//!   the solve retries with looser singular value cutoffs before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_shape_mismatch() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
