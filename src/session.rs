//! Calculation session: text inputs in, snapshots out.
//!
//! A [`Session`] holds the most recent results. Every entry point either
//! completes and replaces its snapshot, or fails and leaves all prior state
//! untouched.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ScrError};
use crate::model::{Rl, System};
use crate::power_angle::{DropLimits, OperatingPoint, OperatingRequest, operating_point};
use crate::scr::{CalculationResult, LineResult, compute_scr, solve_line_for_target_scr};
use crate::sweep::{SweepRow, sweep};
use crate::units::{PerUnit, QuantityKind, parse_quantity, parse_value};

/// Text fields for an SCR calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrInputs {
    pub v_ll: String,
    pub s_n: String,
    pub f: String,
    pub r_line: String,
    pub l_line: String,
    pub r_tr: String,
    pub l_tr: String,
}

impl Default for ScrInputs {
    fn default() -> Self {
        Self {
            v_ll: "380".to_string(),
            s_n: "250000".to_string(),
            f: "60".to_string(),
            r_line: "0.0".to_string(),
            l_line: "7.5e-05".to_string(),
            r_tr: "0.0".to_string(),
            l_tr: "0.0".to_string(),
        }
    }
}

/// Text fields for a target-SCR line solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineInputs {
    pub v_ll: String,
    pub s_n: String,
    pub f: String,
    pub target_scr: String,
    /// Line R/L ratio (Ω/H).
    pub r_over_l: String,
    pub r_tr: String,
    pub l_tr: String,
}

impl Default for LineInputs {
    fn default() -> Self {
        Self {
            v_ll: "380".to_string(),
            s_n: "250000".to_string(),
            f: "60".to_string(),
            target_scr: "3.0".to_string(),
            r_over_l: "0.0".to_string(),
            r_tr: "0.0".to_string(),
            l_tr: "0.0".to_string(),
        }
    }
}

/// Text fields for an operating-point request.
///
/// A positive `p` is solved for its angle; otherwise `delta_deg` is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingInputs {
    /// Real power (W, or with a kW/MW suffix).
    pub p: String,
    pub delta_deg: String,
    /// Current limit (A, or kA); empty for none.
    pub i_max: String,
    /// Voltage-drop limit (%); empty for none.
    pub v_drop_pct: String,
}

impl Default for OperatingInputs {
    fn default() -> Self {
        Self {
            p: "1000".to_string(),
            delta_deg: "10".to_string(),
            i_max: String::new(),
            v_drop_pct: String::new(),
        }
    }
}

/// Holder of the latest calculation snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    /// Interpret `pu` suffixes on impedance fields.
    pub per_unit: bool,
    last_result: Option<CalculationResult>,
    last_line: Option<LineResult>,
    sweep_rows: Vec<SweepRow>,
}

impl Session {
    pub fn new(per_unit: bool) -> Self {
        Self {
            per_unit,
            ..Self::default()
        }
    }

    pub fn last_result(&self) -> Option<&CalculationResult> {
        self.last_result.as_ref()
    }

    pub fn last_line(&self) -> Option<&LineResult> {
        self.last_line.as_ref()
    }

    pub fn sweep_rows(&self) -> &[SweepRow] {
        &self.sweep_rows
    }

    /// Parses the inputs, computes the SCR and stores the result.
    ///
    /// # Errors
    ///
    /// Returns the solver error; the previous snapshot is kept.
    pub fn calc_scr(&mut self, inputs: &ScrInputs) -> Result<CalculationResult> {
        let outcome = self.compute_scr(inputs);
        match outcome {
            Ok(result) => {
                info!(scr = result.scr, zth = result.zth, "SCR calculation complete");
                self.last_result = Some(result);
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "SCR calculation failed");
                Err(e)
            }
        }
    }

    fn compute_scr(&self, inputs: &ScrInputs) -> Result<CalculationResult> {
        let system = parse_system(&inputs.v_ll, &inputs.s_n, &inputs.f);
        let pu = PerUnit::for_system(&system, self.per_unit);
        let line = parse_rl(&inputs.r_line, &inputs.l_line, &pu);
        let transformer = parse_rl(&inputs.r_tr, &inputs.l_tr, &pu);
        compute_scr(&system, line, transformer)
    }

    /// Solves the line impedance for a target SCR and stores the result.
    ///
    /// # Errors
    ///
    /// Returns [`ScrError::InvalidInput`] for a missing target, otherwise the
    /// solver error; the previous snapshot is kept.
    pub fn calc_line(&mut self, inputs: &LineInputs) -> Result<LineResult> {
        let outcome = self.compute_line(inputs);
        match outcome {
            Ok(result) => {
                info!(
                    r_line = result.r_line,
                    l_line = result.l_line,
                    scr = result.scr,
                    "line RL solve complete"
                );
                self.last_line = Some(result);
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "line RL solve failed");
                Err(e)
            }
        }
    }

    fn compute_line(&self, inputs: &LineInputs) -> Result<LineResult> {
        let system = parse_system(&inputs.v_ll, &inputs.s_n, &inputs.f);
        let pu = PerUnit::for_system(&system, self.per_unit);
        let transformer = parse_rl(&inputs.r_tr, &inputs.l_tr, &pu);
        let target = parse_quantity(&inputs.target_scr, QuantityKind::Percent, &PerUnit::disabled())
            .map(|q| q.value)
            .ok_or_else(|| {
                ScrError::InvalidInput(format!("target SCR \"{}\" is not a number", inputs.target_scr))
            })?;
        let rho = if inputs.r_over_l.trim().is_empty() {
            0.0
        } else {
            parse_quantity(&inputs.r_over_l, QuantityKind::Resistance, &PerUnit::disabled())
                .map(|q| q.value)
                .ok_or_else(|| {
                    ScrError::InvalidInput(format!(
                        "R/L ratio \"{}\" is not a number",
                        inputs.r_over_l
                    ))
                })?
        };
        solve_line_for_target_scr(&system, target, rho, transformer)
    }

    /// Regenerates the δ-sweep table from the last SCR result.
    ///
    /// # Errors
    ///
    /// Returns [`ScrError::NoResult`] before any SCR calculation, or
    /// [`ScrError::InvalidInput`] for a bad step.
    pub fn run_sweep(&mut self, delta_max_deg: f64, step_deg: f64) -> Result<&[SweepRow]> {
        let result = self.last_result.ok_or(ScrError::NoResult)?;
        let rows = sweep(
            &result.system(),
            result.total_r(),
            result.total_x(),
            delta_max_deg,
            step_deg,
        )
        .inspect_err(|e| warn!(error = %e, "sweep failed"))?;
        info!(points = rows.len(), "δ-sweep complete");
        self.sweep_rows = rows;
        Ok(&self.sweep_rows)
    }

    /// Solves the operating point on the last SCR result's impedance.
    ///
    /// # Errors
    ///
    /// Returns [`ScrError::NoResult`] before any SCR calculation, or the
    /// power-angle error.
    pub fn operating_point(&self, inputs: &OperatingInputs) -> Result<OperatingPoint> {
        let result = self.last_result.ok_or(ScrError::NoResult)?;
        let pu = PerUnit::disabled();

        let p = parse_value(&inputs.p, QuantityKind::RealPower, &pu, 0.0);
        let request = if p > 0.0 {
            OperatingRequest::Power(p)
        } else {
            let deg = parse_value(&inputs.delta_deg, QuantityKind::Percent, &pu, 0.0);
            OperatingRequest::Angle(deg.to_radians())
        };
        let limits = DropLimits {
            i_max: parse_quantity(&inputs.i_max, QuantityKind::Current, &pu).map(|q| q.value),
            v_drop_pct: parse_quantity(&inputs.v_drop_pct, QuantityKind::Percent, &pu)
                .map(|q| q.value),
        };

        operating_point(
            &result.system(),
            result.total_r(),
            result.total_x(),
            request,
            limits,
        )
        .inspect_err(|e| warn!(error = %e, "operating point failed"))
    }
}

/// Grid ratings are parsed without per-unit interpretation.
fn parse_system(v_ll: &str, s_n: &str, f: &str) -> System {
    let pu = PerUnit::disabled();
    System::new(
        parse_value(v_ll, QuantityKind::Voltage, &pu, 0.0),
        parse_value(s_n, QuantityKind::ApparentPower, &pu, 0.0),
        parse_value(f, QuantityKind::Frequency, &pu, 0.0),
    )
}

fn parse_rl(r: &str, l: &str, pu: &PerUnit) -> Rl {
    Rl::new(
        parse_value(r, QuantityKind::Resistance, pu, 0.0),
        parse_value(l, QuantityKind::Inductance, pu, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_inputs_reproduce_reference_scenario() {
        let mut session = Session::default();
        let res = session.calc_scr(&ScrInputs::default()).expect("valid defaults");
        assert!((res.scr - 20.43).abs() < 0.01);
        assert_eq!(session.last_result(), Some(&res));
    }

    #[test]
    fn failed_calculation_keeps_previous_snapshot() {
        let mut session = Session::default();
        let first = session.calc_scr(&ScrInputs::default()).expect("valid defaults");

        let broken = ScrInputs {
            l_line: "0".to_string(),
            ..ScrInputs::default()
        };
        assert!(session.calc_scr(&broken).is_err());
        assert_eq!(session.last_result(), Some(&first));
    }

    #[test]
    fn unit_strings_are_accepted() {
        let mut session = Session::default();
        let inputs = ScrInputs {
            v_ll: "0.38 kV".to_string(),
            s_n: "0.25 MVA".to_string(),
            l_line: "75uH".to_string(),
            ..ScrInputs::default()
        };
        let res = session.calc_scr(&inputs).expect("valid inputs");
        assert!((res.v_ll - 380.0).abs() < 1e-9);
        assert!((res.l_line - 7.5e-5).abs() < 1e-15);
    }

    #[test]
    fn per_unit_mode_scales_impedances() {
        let inputs = ScrInputs {
            r_line: "0.01pu".to_string(),
            l_line: "0.05pu".to_string(),
            ..ScrInputs::default()
        };
        let sys = System::new(380.0, 250_000.0, 60.0);

        let mut off = Session::new(false);
        assert!(off.calc_scr(&inputs).is_err(), "pu text is unspecified when disabled");

        let mut on = Session::new(true);
        let res = on.calc_scr(&inputs).expect("pu enabled");
        assert!((res.r_line - 0.01 * sys.z_base()).abs() < 1e-12);
        assert!((res.l_line - 0.05 * sys.l_base()).abs() < 1e-15);
    }

    #[test]
    fn line_solve_stores_its_own_snapshot() {
        let mut session = Session::default();
        let res = session.calc_line(&LineInputs::default()).expect("feasible");
        assert!((res.scr - 3.0).abs() < 1e-9);
        assert!(session.last_result().is_none());
        assert_eq!(session.last_line(), Some(&res));
    }

    #[test]
    fn line_solve_requires_numeric_target() {
        let mut session = Session::default();
        let inputs = LineInputs {
            target_scr: "strong".to_string(),
            ..LineInputs::default()
        };
        let err = session.calc_line(&inputs).expect_err("non-numeric target");
        assert!(matches!(err, ScrError::InvalidInput(_)));
        assert!(session.last_line().is_none());
    }

    #[test]
    fn line_solve_rejects_unparsable_ratio() {
        let mut session = Session::new(true);
        for ratio in ["0.1pu", "steep"] {
            let inputs = LineInputs {
                r_over_l: ratio.to_string(),
                ..LineInputs::default()
            };
            let err = session.calc_line(&inputs).expect_err("ratio must be numeric");
            assert!(matches!(err, ScrError::InvalidInput(_)), "{ratio}: {err}");
        }
        assert!(session.last_line().is_none());

        let blank = LineInputs {
            r_over_l: String::new(),
            ..LineInputs::default()
        };
        let res = session.calc_line(&blank).expect("blank ratio means pure inductance");
        assert_eq!(res.r_line, 0.0);
    }

    #[test]
    fn sweep_needs_prior_result() {
        let mut session = Session::default();
        assert_eq!(session.run_sweep(60.0, 0.5).err(), Some(ScrError::NoResult));
        session.calc_scr(&ScrInputs::default()).expect("valid defaults");
        assert_eq!(session.run_sweep(60.0, 0.5).map(|rows| rows.len()), Ok(121));
    }

    #[test]
    fn failed_sweep_keeps_previous_rows() {
        let mut session = Session::default();
        session.calc_scr(&ScrInputs::default()).expect("valid defaults");
        session.run_sweep(10.0, 1.0).expect("valid sweep");
        assert!(session.run_sweep(10.0, 0.0).is_err());
        assert!(session.run_sweep(60.0, 1e-300).is_err());
        assert_eq!(session.sweep_rows().len(), 11);
    }

    #[test]
    fn operating_point_prefers_power_over_angle() {
        let mut session = Session::default();
        session.calc_scr(&ScrInputs::default()).expect("valid defaults");

        let by_power = session
            .operating_point(&OperatingInputs {
                p: "1 MW".to_string(),
                ..OperatingInputs::default()
            })
            .expect("feasible");
        assert!((by_power.p - 1e6).abs() < 1e-6);

        let by_angle = session
            .operating_point(&OperatingInputs {
                p: String::new(),
                delta_deg: "10".to_string(),
                ..OperatingInputs::default()
            })
            .expect("feasible");
        assert!((by_angle.delta - 10.0_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn operating_point_beyond_limit_fails() {
        let mut session = Session::default();
        session.calc_scr(&ScrInputs::default()).expect("valid defaults");
        let err = session
            .operating_point(&OperatingInputs {
                p: "100 MW".to_string(),
                ..OperatingInputs::default()
            })
            .expect_err("beyond P_max");
        assert!(matches!(err, ScrError::PowerExceedsLimit { .. }));
    }
}
