//! API request and response types.
//!
//! Calculation results serialize with the same field names as the CSV
//! export (`V_LL`, `S_sc`, `P_MW`, ...).

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::model::System;
use crate::power_angle::OperatingPoint;
use crate::scr::{CalculationResult, LineResult};

/// Scenario plus the current session snapshots.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Scenario the server was started with.
    pub scenario: ScenarioConfig,
    /// Whether `pu` suffixes are interpreted.
    pub per_unit: bool,
    /// Most recent SCR calculation.
    pub last_result: Option<CalculationResult>,
    /// Most recent target-SCR line solve.
    pub last_line: Option<LineResult>,
    /// Number of rows in the stored sweep.
    pub sweep_points: usize,
}

/// One built-in preset.
#[derive(Debug, Serialize)]
pub struct PresetRecord {
    pub name: String,
    pub system: System,
}

/// Sweep range; missing fields fall back to the scenario's `[sweep]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SweepRequest {
    pub delta_max_deg: Option<f64>,
    pub step_deg: Option<f64>,
}

/// One sample of the P-δ curve.
#[derive(Debug, Serialize)]
pub struct CurvePoint {
    /// Power angle (degrees).
    pub delta_deg: f64,
    /// Real power (W).
    pub p_w: f64,
}

/// Operating point with the P-δ curve of the same impedance.
#[derive(Debug, Serialize)]
pub struct OperateResponse {
    pub point: OperatingPoint,
    pub curve: Vec<CurvePoint>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
