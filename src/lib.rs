//! `sb-bridge` library crate.
//!
//! Fits Gaussian marginals to the opening and closing windows of a trading
//! session and connects them with a Gaussian Schrödinger bridge, reporting the
//! implied drift field and its summary statistics.
//!
//! The binary (`sb`) is a thin wrapper around this library so that the bridge
//! core stays testable without spawning processes.

pub mod app;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
