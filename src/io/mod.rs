//! Input/output helpers.
//!
//! - CSV ingest + persistence of bars and return samples (`ingest`)
//! - result table exports (`export`)
//! - bridge JSON read/write (`bridge_file`)

pub mod bridge_file;
pub mod export;
pub mod ingest;

pub use bridge_file::*;
pub use export::*;
pub use ingest::*;
