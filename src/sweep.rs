//! Power-angle sweeps and time-domain waveform synthesis.

use std::f64::consts::SQRT_2;

use serde::Serialize;

use crate::error::{Result, ScrError};
use crate::model::System;
use crate::power_angle::{CURRENT_SCAN_MAX_DEG, chord_current, impedance_angle, p_of_delta};

/// Slack added to the sweep end so a floating endpoint is still included.
const ENDPOINT_EPS_DEG: f64 = 1e-9;

/// Default number of samples on a P-δ curve.
pub const DEFAULT_CURVE_POINTS: usize = 400;

/// Largest δ-sweep a single call will tabulate.
pub const MAX_SWEEP_ROWS: usize = 1_000_000;

/// Largest waveform a single call will synthesise.
pub const MAX_WAVEFORM_SAMPLES: usize = 1_000_000;

/// One operating point of a δ-sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRow {
    /// Power angle (degrees).
    pub delta_deg: f64,
    /// Real power (MW).
    #[serde(rename = "P_MW")]
    pub p_mw: f64,
    /// Line current magnitude (A).
    #[serde(rename = "I_A")]
    pub i_a: f64,
    /// Voltage across the line (% of phase voltage).
    #[serde(rename = "dV_pct")]
    pub dv_pct: f64,
}

/// Tabulates P, I and ΔV% for angles `0, step, 2·step, …` up to and
/// including `delta_max_deg`.
///
/// A zero impedance reports zero current instead of dividing by zero.
///
/// # Errors
///
/// Returns [`ScrError::InvalidInput`] when `step_deg` is not a positive
/// finite number, `delta_max_deg` is not finite, or the range would need
/// more than [`MAX_SWEEP_ROWS`] rows.
pub fn sweep(
    system: &System,
    r: f64,
    x: f64,
    delta_max_deg: f64,
    step_deg: f64,
) -> Result<Vec<SweepRow>> {
    if !step_deg.is_finite() || step_deg <= 0.0 {
        return Err(ScrError::InvalidInput(format!(
            "sweep step must be positive, got {step_deg}"
        )));
    }
    if !delta_max_deg.is_finite() {
        return Err(ScrError::InvalidInput(format!(
            "sweep end must be finite, got {delta_max_deg}"
        )));
    }

    let stop = delta_max_deg.max(0.0) + ENDPOINT_EPS_DEG;
    let count = (stop / step_deg).ceil();
    if !count.is_finite() || count > MAX_SWEEP_ROWS as f64 {
        return Err(ScrError::InvalidInput(format!(
            "sweep of {delta_max_deg}° in steps of {step_deg}° exceeds {MAX_SWEEP_ROWS} rows"
        )));
    }
    let count = count as usize;
    let v_ph = system.v_ph();
    let z_abs = r.hypot(x);

    let rows = (0..count)
        .map(|k| {
            let delta_deg = k as f64 * step_deg;
            let d = delta_deg.to_radians();
            let p = p_of_delta(system.v_ll, r, x, d);
            let i_a = if z_abs > 0.0 {
                chord_current(v_ph, z_abs, d)
            } else {
                0.0
            };
            let drop = 2.0 * v_ph * (d / 2.0).sin();
            SweepRow {
                delta_deg,
                p_mw: p / 1e6,
                i_a,
                dv_pct: drop / v_ph * 100.0,
            }
        })
        .collect();
    Ok(rows)
}

/// Renders sweep rows as a fixed-point text table.
pub fn sweep_summary(rows: &[SweepRow]) -> String {
    let mut out = String::from("δ,P[MW],I[A],ΔV[%]");
    for r in rows {
        out.push_str(&format!(
            "\n{:.2},{:.6},{:.3},{:.3}",
            r.delta_deg, r.p_mw, r.i_a, r.dv_pct
        ));
    }
    out
}

/// Samples `P(δ)` on `[0, min(θ, 89.9°)]` as `(δ rad, P W)` pairs.
pub fn p_delta_curve(v_ll: f64, r: f64, x: f64, points: usize) -> Vec<(f64, f64)> {
    let end = impedance_angle(r, x).min(CURRENT_SCAN_MAX_DEG.to_radians());
    let z_abs = r.hypot(x);
    let spacing = if points > 1 {
        end / (points - 1) as f64
    } else {
        0.0
    };
    (0..points)
        .map(|k| {
            let d = k as f64 * spacing;
            let p = if z_abs > 0.0 {
                p_of_delta(v_ll, r, x, d)
            } else {
                0.0
            };
            (d, p)
        })
        .collect()
}

/// Co-indexed instantaneous grid voltage, inverter voltage and current.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Waveforms {
    /// Time base (s).
    pub t: Vec<f64>,
    /// Grid-side phase voltage at phase 0 (V).
    pub v_pcc: Vec<f64>,
    /// Inverter-side phase voltage at phase δ (V).
    pub v_inv: Vec<f64>,
    /// Line current (A).
    pub i: Vec<f64>,
}

/// One instant of a [`Waveforms`] set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSample {
    pub t: f64,
    pub v_pcc: f64,
    pub v_inv: f64,
    pub i: f64,
}

impl Waveforms {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Iterates the samples in time order.
    pub fn samples(&self) -> impl Iterator<Item = WaveSample> + '_ {
        (0..self.len()).map(|k| WaveSample {
            t: self.t[k],
            v_pcc: self.v_pcc[k],
            v_inv: self.v_inv[k],
            i: self.i[k],
        })
    }
}

/// Synthesises `cycles · points_per_cycle` samples over `[0, cycles/f)`.
///
/// Peaks are `√2·RMS`: the grid voltage sits at phase 0, the inverter
/// voltage at `delta` and the current at `i_angle`.
///
/// # Errors
///
/// Returns [`ScrError::InvalidInput`] when the sample count overflows or
/// exceeds [`MAX_WAVEFORM_SAMPLES`].
///
/// # Examples
///
/// ```
/// use scr_calc::model::System;
/// use scr_calc::sweep::waveforms;
///
/// let sys = System::new(380.0, 250_000.0, 60.0);
/// let w = waveforms(&sys, 10.0, 0.1, 0.05, 2, 400).unwrap();
/// assert_eq!(w.len(), 800);
/// assert_eq!(w.t[0], 0.0);
/// ```
pub fn waveforms(
    system: &System,
    i_rms: f64,
    delta: f64,
    i_angle: f64,
    cycles: usize,
    points_per_cycle: usize,
) -> Result<Waveforms> {
    let n = cycles
        .checked_mul(points_per_cycle)
        .filter(|&n| n <= MAX_WAVEFORM_SAMPLES)
        .ok_or_else(|| {
            ScrError::InvalidInput(format!(
                "{cycles} cycles of {points_per_cycle} points exceeds {MAX_WAVEFORM_SAMPLES} samples"
            ))
        })?;
    let span = cycles as f64 / system.f;
    let omega = system.omega();
    let v_peak = SQRT_2 * system.v_ph();
    let i_peak = SQRT_2 * i_rms;

    let mut out = Waveforms {
        t: Vec::with_capacity(n),
        v_pcc: Vec::with_capacity(n),
        v_inv: Vec::with_capacity(n),
        i: Vec::with_capacity(n),
    };
    for k in 0..n {
        let t = k as f64 * span / n as f64;
        let wt = omega * t;
        out.t.push(t);
        out.v_pcc.push(v_peak * wt.sin());
        out.v_inv.push(v_peak * (wt + delta).sin());
        out.i.push(i_peak * (wt + i_angle).sin());
    }
    Ok(out)
}
