//! Steady-state power transfer across a fixed series impedance.
//!
//! A source `E∠δ` drives a receiving bus `V∠0` through `Z = R + jX`, with
//! both ends held at the same magnitude. Angles are in radians.

use std::fmt;

use num_complex::Complex64;
use serde::Serialize;

use crate::error::{Result, ScrError};
use crate::model::System;

/// Number of samples in the current drop-limit scan.
pub const CURRENT_SCAN_STEPS: usize = 2000;

/// Upper end of the current drop-limit scan (degrees).
pub const CURRENT_SCAN_MAX_DEG: f64 = 89.9;

/// Clamp used when the voltage-drop limit is unreachable below 180°.
const VOLTAGE_LIMIT_CLAMP_DEG: f64 = 180.0 - 1e-3;

/// Impedance angle `atan2(X, R)`, zero for an ideal short.
pub fn impedance_angle(r: f64, x: f64) -> f64 {
    if r == 0.0 && x == 0.0 {
        0.0
    } else {
        x.atan2(r)
    }
}

/// Real power transferred at angle `delta` (W).
///
/// `P = (V_LL² / |Z|) · (cos(θ − δ) − cos θ)`. A zero impedance yields a
/// non-finite result.
pub fn p_of_delta(v_ll: f64, r: f64, x: f64, delta: f64) -> f64 {
    let z_abs = r.hypot(x);
    let theta = impedance_angle(r, x);
    (v_ll * v_ll / z_abs) * ((theta - delta).cos() - theta.cos())
}

/// Maximum transferable real power, reached at `δ = θ` (W).
pub fn p_max(v_ll: f64, r: f64, x: f64) -> f64 {
    let z_abs = r.hypot(x);
    if z_abs > 0.0 {
        (v_ll * v_ll / z_abs) * (1.0 - impedance_angle(r, x).cos())
    } else {
        0.0
    }
}

/// Power angle that transfers `p` watts, the inverse of [`p_of_delta`] on
/// `[0, θ]`.
///
/// # Errors
///
/// Returns [`ScrError::PowerExceedsLimit`] when `p` lies outside the
/// transferable range.
pub fn delta_from_p(v_ll: f64, r: f64, x: f64, p: f64) -> Result<f64> {
    let z_abs = r.hypot(x);
    let theta = impedance_angle(r, x);
    let rhs = theta.cos() + p * z_abs / (v_ll * v_ll);
    if !(-1.0..=1.0).contains(&rhs) {
        return Err(ScrError::PowerExceedsLimit {
            requested_w: p,
            max_w: p_max(v_ll, r, x),
        });
    }
    Ok(theta - rhs.acos())
}

/// Line current magnitude `2·V_ph·sin(δ/2) / |Z|` (A).
pub fn chord_current(v_ph: f64, z_abs: f64, delta: f64) -> f64 {
    2.0 * v_ph * (delta / 2.0).sin() / z_abs
}

/// Smallest angle in `[0°, 89.9°]` at which the line current reaches
/// `target_i`, found by a linear scan of [`CURRENT_SCAN_STEPS`] evenly spaced
/// samples (endpoints included).
///
/// Resolution is bounded by the sample spacing, about 0.045°. Returns `None`
/// when `target_i` is not positive or no sample reaches it.
pub fn current_drop_limit(v_ph: f64, z_abs: f64, target_i: f64) -> Option<f64> {
    if target_i.is_nan() || target_i <= 0.0 {
        return None;
    }
    let max = CURRENT_SCAN_MAX_DEG.to_radians();
    let spacing = max / (CURRENT_SCAN_STEPS - 1) as f64;
    (0..CURRENT_SCAN_STEPS)
        .map(|k| k as f64 * spacing)
        .find(|&d| chord_current(v_ph, z_abs, d) >= target_i)
}

/// Closed-form counterpart of [`current_drop_limit`]:
/// `δ = 2·asin(I·|Z| / (2·V_ph))`, restricted to the same `[0°, 89.9°]` range.
pub fn current_drop_limit_exact(v_ph: f64, z_abs: f64, target_i: f64) -> Option<f64> {
    if target_i.is_nan() || target_i <= 0.0 {
        return None;
    }
    let s = target_i * z_abs / (2.0 * v_ph);
    if s.is_nan() || s >= 1.0 {
        return None;
    }
    let delta = 2.0 * s.asin();
    (delta <= CURRENT_SCAN_MAX_DEG.to_radians()).then_some(delta)
}

/// Angle at which the voltage across the line reaches `target_pct` percent
/// of phase voltage, from `|E − V| = 2·V_ph·sin(δ/2)`.
///
/// Returns `None` when `target_pct` is not positive. Targets at or above
/// 200% clamp just below 180°.
///
/// # Examples
///
/// ```
/// use scr_calc::power_angle::voltage_drop_limit;
///
/// assert_eq!(voltage_drop_limit(220.0, 0.0), None);
/// let d = voltage_drop_limit(220.0, 10.0).unwrap();
/// assert!((d - 2.0 * 0.05_f64.asin()).abs() < 1e-15);
/// ```
pub fn voltage_drop_limit(v_ph: f64, target_pct: f64) -> Option<f64> {
    if target_pct.is_nan() || target_pct <= 0.0 {
        return None;
    }
    let lim = target_pct / 100.0 * v_ph;
    let s = lim / (2.0 * v_ph);
    if s <= 0.0 {
        Some(0.0)
    } else if s >= 1.0 {
        Some(VOLTAGE_LIMIT_CLAMP_DEG.to_radians())
    } else {
        Some(2.0 * s.asin())
    }
}

/// How an operating point is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatingRequest {
    /// Real power to transfer (W); the angle is solved.
    Power(f64),
    /// Power angle (rad); the power is evaluated.
    Angle(f64),
}

/// Optional limits whose angles are reported alongside an operating point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DropLimits {
    /// Maximum line current (A).
    pub i_max: Option<f64>,
    /// Maximum voltage drop (% of phase voltage).
    pub v_drop_pct: Option<f64>,
}

/// Steady-state phasor solution at one power angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingPoint {
    /// Power angle (rad).
    pub delta: f64,
    /// Transferred real power (W).
    pub p: f64,
    /// Maximum transferable real power (W).
    pub p_max: f64,
    /// Impedance angle (rad).
    pub theta: f64,
    /// Impedance magnitude (Ω).
    pub z_abs: f64,
    /// RMS line current (A).
    pub i_rms: f64,
    /// Line current phase (rad).
    pub i_angle: f64,
    /// Angle at which the current limit is reached (rad).
    pub delta_i_limit: Option<f64>,
    /// Angle at which the voltage-drop limit is reached (rad).
    pub delta_v_limit: Option<f64>,
}

impl fmt::Display for OperatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Operating Point ---")?;
        writeln!(f, "P:          {:.3} MW", self.p / 1e6)?;
        writeln!(f, "δ:          {:.2}°", self.delta.to_degrees())?;
        writeln!(f, "P_max:      {:.3} MW", self.p_max / 1e6)?;
        write!(f, "I:          {:.1} A", self.i_rms)?;
        if let Some(d) = self.delta_i_limit {
            write!(f, "\nI_max @     {:.1}°", d.to_degrees())?;
        }
        if let Some(d) = self.delta_v_limit {
            write!(f, "\nΔV% @       {:.1}°", d.to_degrees())?;
        }
        Ok(())
    }
}

/// Solves the operating point of `system` behind `R + jX`.
///
/// The current phasor is `(E∠δ − V) / Z` with `E = V = V_ph`.
///
/// # Errors
///
/// * [`ScrError::Degenerate`] for an invalid system or zero impedance
/// * [`ScrError::PowerExceedsLimit`] when a requested power is out of range
pub fn operating_point(
    system: &System,
    r: f64,
    x: f64,
    request: OperatingRequest,
    limits: DropLimits,
) -> Result<OperatingPoint> {
    system.validate()?;
    let z_abs = r.hypot(x);
    if z_abs == 0.0 {
        return Err(ScrError::Degenerate(
            "operating point needs a non-zero impedance".to_string(),
        ));
    }
    let v_ll = system.v_ll;
    let v_ph = system.v_ph();

    let (delta, p) = match request {
        OperatingRequest::Power(p) => (delta_from_p(v_ll, r, x, p)?, p),
        OperatingRequest::Angle(delta) => (delta, p_of_delta(v_ll, r, x, delta)),
    };

    let e = Complex64::from_polar(v_ph, delta);
    let v = Complex64::new(v_ph, 0.0);
    let current = (e - v) / Complex64::new(r, x);

    Ok(OperatingPoint {
        delta,
        p,
        p_max: p_max(v_ll, r, x),
        theta: impedance_angle(r, x),
        z_abs,
        i_rms: current.norm(),
        i_angle: current.arg(),
        delta_i_limit: limits.i_max.and_then(|i| current_drop_limit(v_ph, z_abs, i)),
        delta_v_limit: limits.v_drop_pct.and_then(|pct| voltage_drop_limit(v_ph, pct)),
    })
}
