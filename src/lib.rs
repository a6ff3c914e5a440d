//! Short-circuit ratio (SCR) engine for converter grid interconnections.
//!
//! Parses free-form electrical quantities, computes Thevenin impedance,
//! short-circuit capacity and SCR, solves line impedance for a target SCR,
//! and evaluates steady-state power-angle behaviour, sweeps and waveforms.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod power_angle;
pub mod runner;
pub mod scr;
pub mod session;
pub mod sweep;
pub mod units;

pub use error::{Result, ScrError};
