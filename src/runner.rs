//! Scenario loading and command dispatch for the binary.
//!
//! Computed reports go to the given writer (stdout in the binary); notices
//! about written files go to stderr.

use std::io::Write;

use anyhow::{Context, bail};

use crate::cli::{Cli, Command, OperateArgs, SweepArgs};
use crate::config::ScenarioConfig;
use crate::io::export::{export_results_csv, export_sweep_csv, export_waveform_csv};
use crate::session::Session;
use crate::sweep::{sweep_summary, waveforms};

/// Resolves the scenario source and validates it.
///
/// `--scenario` takes priority, then `--preset`, then the baseline preset.
/// `--pu` switches per-unit parsing on regardless of the scenario file.
///
/// # Errors
///
/// Returns the load error, or every validation error joined by newlines.
pub fn load_scenario(cli: &Cli) -> anyhow::Result<ScenarioConfig> {
    let mut scenario = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };
    if cli.pu {
        scenario.options.per_unit = true;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("{}", lines.join("\n"));
    }
    Ok(scenario)
}

/// Runs one subcommand against a validated scenario.
///
/// # Errors
///
/// Returns calculation, export and write errors with context attached.
pub fn execute(
    command: &Command,
    scenario: &ScenarioConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut session = Session::new(scenario.options.per_unit);

    match command {
        Command::Scr => {
            let result = session.calc_scr(&scenario.scr_inputs())?;
            writeln!(out, "{result}")?;
        }
        Command::Line => {
            let line = session.calc_line(&scenario.line_inputs())?;
            writeln!(out, "{line}")?;
        }
        Command::Operate(args) => run_operate(&mut session, scenario, args, out)?,
        Command::Sweep(args) => run_sweep(&mut session, scenario, args, out)?,
        Command::Export { out: path } => {
            session.calc_scr(&scenario.scr_inputs())?;
            // An infeasible target still exports the SCR row.
            if let Err(e) = session.calc_line(&scenario.line_inputs()) {
                eprintln!("Line row omitted from export: {e}");
            }
            export_results_csv(session.last_result(), session.last_line(), path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Results written to {}", path.display());
        }
        Command::Presets => {
            for name in ScenarioConfig::PRESETS {
                let sys = ScenarioConfig::from_preset(name)?.system();
                writeln!(
                    out,
                    "{name:<10} V_LL={} V  S_n={} VA  f={} Hz",
                    sys.v_ll, sys.s_n, sys.f
                )?;
            }
        }
        #[cfg(feature = "api")]
        Command::Serve { bind } => {
            use std::sync::Arc;

            let state = Arc::new(crate::api::AppState::new(scenario.clone()));
            let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
            rt.block_on(crate::api::serve(state, *bind))?;
        }
    }
    Ok(())
}

fn run_operate(
    session: &mut Session,
    scenario: &ScenarioConfig,
    args: &OperateArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let result = session.calc_scr(&scenario.scr_inputs())?;
    let op = session.operating_point(&scenario.operating_inputs())?;
    writeln!(out, "{op}")?;

    if let Some(path) = &args.waveform_out {
        let waves = waveforms(
            &result.system(),
            op.i_rms,
            op.delta,
            op.i_angle,
            args.cycles,
            args.points_per_cycle,
        )?;
        export_waveform_csv(&waves, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Waveforms written to {}", path.display());
    }
    Ok(())
}

fn run_sweep(
    session: &mut Session,
    scenario: &ScenarioConfig,
    args: &SweepArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    session.calc_scr(&scenario.scr_inputs())?;
    let delta_max = args.delta_max.unwrap_or(scenario.sweep.delta_max_deg);
    let step = args.step.unwrap_or(scenario.sweep.step_deg);
    let rows = session.run_sweep(delta_max, step)?;
    writeln!(out, "{}", sweep_summary(rows))?;

    if let Some(path) = &args.out {
        export_sweep_csv(rows, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Sweep written to {}", path.display());
    }
    Ok(())
}
