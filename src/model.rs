//! Grid and impedance value types.

use std::f64::consts::PI;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrError};

/// Grid at the point of connection.
///
/// Derived quantities are recomputed from the stored fields on every call.
/// The constructor accepts any values; use [`System::validate`] before
/// relying on the derived bases.
///
/// # Examples
///
/// ```
/// use scr_calc::model::System;
///
/// let sys = System::new(400.0, 250_000.0, 50.0);
/// assert_eq!(sys.z_base(), 400.0 * 400.0 / 250_000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct System {
    /// Line-to-line RMS voltage (V).
    pub v_ll: f64,
    /// Rated apparent power (VA).
    pub s_n: f64,
    /// Frequency (Hz).
    pub f: f64,
}

impl System {
    pub fn new(v_ll: f64, s_n: f64, f: f64) -> Self {
        Self { v_ll, s_n, f }
    }

    /// Angular frequency `2πf` (rad/s).
    pub fn omega(&self) -> f64 {
        2.0 * PI * self.f
    }

    /// Base impedance `V_LL² / S_n` (Ω).
    pub fn z_base(&self) -> f64 {
        self.v_ll * self.v_ll / self.s_n
    }

    /// Base inductance `Z_base / ω` (H).
    pub fn l_base(&self) -> f64 {
        self.z_base() / self.omega()
    }

    /// Phase voltage `V_LL / √3` (V).
    pub fn v_ph(&self) -> f64 {
        self.v_ll / 3.0_f64.sqrt()
    }

    /// Rated line current `S_n / (√3·V_LL)` (A).
    pub fn rated_current(&self) -> f64 {
        self.s_n / (3.0_f64.sqrt() * self.v_ll)
    }

    /// Rejects ratings for which the derived quantities are undefined.
    ///
    /// # Errors
    ///
    /// Returns [`ScrError::Degenerate`] naming the first non-positive or
    /// non-finite field.
    pub fn validate(&self) -> Result<()> {
        let fields = [("V_LL", self.v_ll), ("S_n", self.s_n), ("f", self.f)];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScrError::Degenerate(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Series resistance and inductance per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rl {
    /// Resistance (Ω/phase).
    pub r: f64,
    /// Inductance (H/phase).
    pub l: f64,
}

impl Rl {
    pub fn new(r: f64, l: f64) -> Self {
        Self { r, l }
    }

    /// Reactance `ωL` (Ω).
    pub fn reactance(&self, omega: f64) -> f64 {
        omega * self.l
    }

    /// Impedance magnitude `hypot(R, ωL)` (Ω).
    pub fn zabs(&self, omega: f64) -> f64 {
        self.r.hypot(self.reactance(omega))
    }
}

impl Add for Rl {
    type Output = Rl;

    fn add(self, rhs: Rl) -> Rl {
        Rl::new(self.r + rhs.r, self.l + rhs.l)
    }
}
