//! SCR calculator entry point: logging setup, CLI parsing and dispatch.

use std::io;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scr_calc::cli::Cli;
use scr_calc::runner::{execute, load_scenario};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = load_scenario(&cli).and_then(|scenario| {
        let stdout = io::stdout();
        execute(&cli.command, &scenario, &mut stdout.lock())
    });

    if let Err(e) = outcome {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
