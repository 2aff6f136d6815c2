//! Terminal plots of a bridge path.

pub mod ascii;

pub use ascii::*;
