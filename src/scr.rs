//! Short-circuit ratio solver.
//!
//! Forward direction: Thevenin impedance, short-circuit capacity, SCR and
//! current ratio from a system plus line and transformer impedances.
//! Inverse direction: the line impedance that yields a target SCR for a
//! fixed R/L ratio.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ScrError};
use crate::model::{Rl, System};

/// Snapshot of one successful SCR calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalculationResult {
    /// Line-to-line voltage (V).
    #[serde(rename = "V_LL")]
    pub v_ll: f64,
    /// Rated apparent power (VA).
    #[serde(rename = "S_n")]
    pub s_n: f64,
    /// Frequency (Hz).
    pub f: f64,
    /// Line resistance (Ω/phase).
    #[serde(rename = "R_line")]
    pub r_line: f64,
    /// Line inductance (H/phase).
    #[serde(rename = "L_line")]
    pub l_line: f64,
    /// Transformer resistance (Ω/phase).
    #[serde(rename = "R_tr")]
    pub r_tr: f64,
    /// Transformer inductance (H/phase).
    #[serde(rename = "L_tr")]
    pub l_tr: f64,
    /// Thevenin impedance magnitude (Ω/phase).
    #[serde(rename = "Zth")]
    pub zth: f64,
    /// Short-circuit apparent power (VA).
    #[serde(rename = "S_sc")]
    pub s_sc: f64,
    /// Short-circuit ratio `S_sc / S_n`.
    #[serde(rename = "SCR")]
    pub scr: f64,
    /// Short-circuit to rated current ratio.
    #[serde(rename = "I_ratio")]
    pub i_ratio: f64,
}

impl CalculationResult {
    /// Grid the calculation was run for.
    pub fn system(&self) -> System {
        System::new(self.v_ll, self.s_n, self.f)
    }

    /// Line and transformer in series.
    pub fn total_rl(&self) -> Rl {
        Rl::new(self.r_line, self.l_line) + Rl::new(self.r_tr, self.l_tr)
    }

    /// Total series resistance (Ω).
    pub fn total_r(&self) -> f64 {
        self.total_rl().r
    }

    /// Total series reactance at the system frequency (Ω).
    pub fn total_x(&self) -> f64 {
        self.total_rl().reactance(self.system().omega())
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- SCR Calculation ---")?;
        writeln!(f, "|Z_th|:     {:.6} Ω/phase", self.zth)?;
        writeln!(f, "S_sc:       {:.3} MVA", self.s_sc / 1e6)?;
        writeln!(f, "SCR:        {:.3}", self.scr)?;
        write!(f, "I_sc/I_r:   {:.3}", self.i_ratio)
    }
}

/// Snapshot of one successful target-SCR line solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineResult {
    /// Solved line resistance (Ω/phase).
    #[serde(rename = "R_line")]
    pub r_line: f64,
    /// Solved line inductance (H/phase).
    #[serde(rename = "L_line")]
    pub l_line: f64,
    /// Thevenin impedance of line plus transformer (Ω/phase).
    #[serde(rename = "Zth")]
    pub zth: f64,
    /// Short-circuit apparent power (VA).
    #[serde(rename = "S_sc")]
    pub s_sc: f64,
    /// Achieved short-circuit ratio.
    #[serde(rename = "SCR")]
    pub scr: f64,
}

impl LineResult {
    pub fn line(&self) -> Rl {
        Rl::new(self.r_line, self.l_line)
    }
}

impl fmt::Display for LineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Line RL for Target SCR ---")?;
        writeln!(f, "R_line:     {:.6} Ω/phase", self.r_line)?;
        writeln!(f, "L_line:     {:.9e} H/phase", self.l_line)?;
        writeln!(f, "|Z_th|:     {:.6} Ω/phase", self.zth)?;
        writeln!(f, "S_sc:       {:.3} MVA", self.s_sc / 1e6)?;
        write!(f, "SCR:        {:.3}", self.scr)
    }
}

/// Short-circuit apparent power `V_LL² / |Z|` (VA).
///
/// # Errors
///
/// Returns [`ScrError::Degenerate`] when `z_abs` is zero or not finite.
pub fn short_circuit_apparent_power(v_ll: f64, z_abs: f64) -> Result<f64> {
    if z_abs == 0.0 || !z_abs.is_finite() {
        return Err(ScrError::Degenerate(format!(
            "Thevenin impedance must be non-zero and finite, got {z_abs}"
        )));
    }
    Ok(v_ll * v_ll / z_abs)
}

/// Computes Thevenin impedance, short-circuit capacity, SCR and current
/// ratio for `line` and `transformer` in series.
///
/// # Errors
///
/// Returns [`ScrError::Degenerate`] for a non-positive rating or a zero
/// total impedance.
///
/// # Examples
///
/// ```
/// use scr_calc::model::{Rl, System};
/// use scr_calc::scr::compute_scr;
///
/// let sys = System::new(380.0, 250_000.0, 60.0);
/// let res = compute_scr(&sys, Rl::new(0.0, 7.5e-5), Rl::default()).unwrap();
/// assert!((res.scr - 20.43).abs() < 0.01);
/// ```
pub fn compute_scr(system: &System, line: Rl, transformer: Rl) -> Result<CalculationResult> {
    system.validate()?;
    let zth = (line + transformer).zabs(system.omega());
    let s_sc = short_circuit_apparent_power(system.v_ll, zth)?;
    let scr = s_sc / system.s_n;

    let i_rated = system.rated_current();
    let i_sc = s_sc / (3.0_f64.sqrt() * system.v_ll);
    let i_ratio = i_sc / i_rated;

    debug!(zth, s_sc, scr, i_ratio, "computed SCR");

    Ok(CalculationResult {
        v_ll: system.v_ll,
        s_n: system.s_n,
        f: system.f,
        r_line: line.r,
        l_line: line.l,
        r_tr: transformer.r,
        l_tr: transformer.l,
        zth,
        s_sc,
        scr,
        i_ratio,
    })
}

/// Solves the line impedance that, in series with `transformer`, gives
/// `target_scr`, with line resistance fixed at `r_over_l · L`.
///
/// Of the two quadratic roots the smaller non-negative inductance is
/// returned, i.e. the least added line impedance.
///
/// # Errors
///
/// * [`ScrError::InvalidInput`] for a non-positive target or non-finite ratio
/// * [`ScrError::NoRealSolution`] when the discriminant is negative
/// * [`ScrError::NoPositiveSolution`] when both roots are negative
pub fn solve_line_rl_for_target_scr(
    system: &System,
    target_scr: f64,
    r_over_l: f64,
    transformer: Rl,
) -> Result<Rl> {
    system.validate()?;
    if !target_scr.is_finite() || target_scr <= 0.0 {
        return Err(ScrError::InvalidInput(format!(
            "target SCR must be positive, got {target_scr}"
        )));
    }
    if !r_over_l.is_finite() {
        return Err(ScrError::InvalidInput(format!(
            "R/L ratio must be finite, got {r_over_l}"
        )));
    }

    let z_target = system.v_ll * system.v_ll / (target_scr * system.s_n);
    let w = system.omega();
    let rho = r_over_l;
    let Rl { r: r_tr, l: l_tr } = transformer;

    let a = rho * rho + w * w;
    let b = 2.0 * (r_tr * rho + w * w * l_tr);
    let c = r_tr * r_tr + w * w * l_tr * l_tr - z_target * z_target;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Err(ScrError::NoRealSolution { target_scr });
    }

    let sqrt_disc = disc.sqrt();
    let roots = [(-b + sqrt_disc) / (2.0 * a), (-b - sqrt_disc) / (2.0 * a)];
    let l_line = roots
        .into_iter()
        .filter(|l| *l >= 0.0)
        .min_by(f64::total_cmp)
        .ok_or(ScrError::NoPositiveSolution { target_scr })?;

    debug!(z_target, disc, l_line, "solved line inductance");

    Ok(Rl::new(rho * l_line, l_line))
}

/// Solves the line for `target_scr` and re-evaluates the resulting grid.
///
/// # Errors
///
/// Propagates every failure of [`solve_line_rl_for_target_scr`] and
/// [`compute_scr`].
pub fn solve_line_for_target_scr(
    system: &System,
    target_scr: f64,
    r_over_l: f64,
    transformer: Rl,
) -> Result<LineResult> {
    let line = solve_line_rl_for_target_scr(system, target_scr, r_over_l, transformer)?;
    let check = compute_scr(system, line, transformer)?;
    Ok(LineResult {
        r_line: line.r,
        l_line: line.l,
        zth: check.zth,
        s_sc: check.s_sc,
        scr: check.scr,
    })
}
