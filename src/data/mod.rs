//! Market data and sample preparation.
//!
//! - intraday bars from the chart API (`yahoo`)
//! - log returns and clock windows (`returns`)
//! - Gaussian marginal fitting (`marginal`)
//! - reference diffusion estimate (`diffusion`)
//! - seeded synthetic samples (`sample`)

pub mod diffusion;
pub mod marginal;
pub mod returns;
pub mod sample;
pub mod yahoo;

pub use diffusion::*;
pub use marginal::*;
pub use returns::*;
pub use sample::*;
pub use yahoo::*;
