//! Numeric utilities: time grid, interpolation, finite differences,
//! descriptive statistics and least squares.

pub mod diff;
pub mod grid;
pub mod interp;
pub mod ols;
pub mod stats;

pub use diff::*;
pub use grid::*;
pub use interp::*;
pub use ols::*;
pub use stats::*;
