//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - endpoint marginals and their provenance (`GaussianMarginal`, `FittedMarginal`)
//! - bridge configuration and outputs (`BridgeConfig`, `BridgePath`, `DriftField`, `BridgeSummary`)
//! - raw market inputs (`PriceBar`, `TimedReturn`, `WindowSamples`)
//! - the saved bridge file schema (`BridgeFile`)

pub mod types;

pub use types::*;
