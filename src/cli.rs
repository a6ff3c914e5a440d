//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Short-circuit ratio calculator for grid-connected inverters.
///
/// If neither `--scenario` nor `--preset` is given, the `380V/60Hz` preset
/// is used.
#[derive(Debug, Parser)]
#[command(name = "scr-calc", version)]
pub struct Cli {
    /// Load scenario from a TOML config file.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (380V/60Hz, 400V/50Hz, 480V/60Hz).
    #[arg(long, global = true, value_name = "NAME")]
    pub preset: Option<String>,

    /// Interpret `pu` suffixes on impedance fields.
    #[arg(long, global = true)]
    pub pu: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute Thevenin impedance, S_sc and SCR from the scenario.
    Scr,
    /// Solve the line R/L that meets the target SCR.
    Line,
    /// Solve the operating point on the scenario's grid impedance.
    Operate(OperateArgs),
    /// Tabulate P, I and ΔV% over a range of power angles.
    Sweep(SweepArgs),
    /// Write SCR and line results to a CSV file.
    Export {
        /// Output CSV path.
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// List the built-in presets.
    Presets,
    /// Serve the calculator over HTTP.
    #[cfg(feature = "api")]
    Serve {
        /// Socket address to bind.
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: std::net::SocketAddr,
    },
}

#[derive(Debug, Args)]
pub struct OperateArgs {
    /// Write voltage and current waveforms to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub waveform_out: Option<PathBuf>,

    /// Number of cycles in the waveform export.
    #[arg(long, default_value_t = 2)]
    pub cycles: usize,

    /// Samples per cycle in the waveform export.
    #[arg(long, default_value_t = 400)]
    pub points_per_cycle: usize,
}

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Largest swept angle in degrees; defaults to the scenario value.
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub delta_max: Option<f64>,

    /// Angle increment in degrees; defaults to the scenario value.
    #[arg(long, value_name = "DEG")]
    pub step: Option<f64>,

    /// Write the sweep table to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}
