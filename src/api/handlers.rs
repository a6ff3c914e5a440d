//! Request handlers for the API endpoints.

use std::sync::{Arc, PoisonError};

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    CurvePoint, ErrorResponse, OperateResponse, PresetRecord, StateResponse, SweepRequest,
};
use crate::config::ScenarioConfig;
use crate::error::ScrError;
use crate::io::export::write_sweep_csv;
use crate::scr::{CalculationResult, LineResult};
use crate::session::{LineInputs, OperatingInputs, ScrInputs};
use crate::sweep::{DEFAULT_CURVE_POINTS, SweepRow, p_delta_curve};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a calculation error to a status: 409 before any SCR result, 422 otherwise.
fn reject(e: ScrError) -> ApiError {
    let status = match e {
        ScrError::NoResult => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let session = state.session.read().unwrap_or_else(PoisonError::into_inner);
    Json(StateResponse {
        scenario: state.scenario.clone(),
        per_unit: session.per_unit,
        last_result: session.last_result().copied(),
        last_line: session.last_line().copied(),
        sweep_points: session.sweep_rows().len(),
    })
}

/// `GET /presets` → 200 + `Vec<PresetRecord>` JSON
pub async fn get_presets() -> Json<Vec<PresetRecord>> {
    let records = ScenarioConfig::PRESETS
        .iter()
        .filter_map(|name| {
            ScenarioConfig::from_preset(name)
                .ok()
                .map(|cfg| PresetRecord {
                    name: (*name).to_string(),
                    system: cfg.system(),
                })
        })
        .collect();
    Json(records)
}

/// Runs an SCR calculation and stores it as the current result.
///
/// `POST /scr` → 200 + `CalculationResult` JSON, or 422 + `ErrorResponse`
pub async fn post_scr(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<ScrInputs>,
) -> Result<Json<CalculationResult>, ApiError> {
    let mut session = state.session.write().unwrap_or_else(PoisonError::into_inner);
    session.calc_scr(&inputs).map(Json).map_err(reject)
}

/// `POST /line` → 200 + `LineResult` JSON, or 422 + `ErrorResponse`
pub async fn post_line(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<LineInputs>,
) -> Result<Json<LineResult>, ApiError> {
    let mut session = state.session.write().unwrap_or_else(PoisonError::into_inner);
    session.calc_line(&inputs).map(Json).map_err(reject)
}

/// Regenerates the sweep from the current result.
///
/// `POST /sweep` → 200 + `Vec<SweepRow>` JSON
/// `POST /sweep` before `/scr` → 409 + `ErrorResponse`
pub async fn post_sweep(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SweepRequest>,
) -> Result<Json<Vec<SweepRow>>, ApiError> {
    let delta_max = req.delta_max_deg.unwrap_or(state.scenario.sweep.delta_max_deg);
    let step = req.step_deg.unwrap_or(state.scenario.sweep.step_deg);
    let mut session = state.session.write().unwrap_or_else(PoisonError::into_inner);
    session
        .run_sweep(delta_max, step)
        .map(|rows| Json(rows.to_vec()))
        .map_err(reject)
}

/// `GET /sweep.csv` → 200 + `text/csv`, or 409 when no sweep has run
pub async fn get_sweep_csv(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.read().unwrap_or_else(PoisonError::into_inner);
    if session.sweep_rows().is_empty() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "no sweep to export; run /sweep first".to_string(),
            }),
        ));
    }

    let mut body = Vec::new();
    write_sweep_csv(session.sweep_rows(), &mut body).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body))
}

/// Solves the operating point on the current result's impedance.
///
/// `POST /operate` → 200 + `OperateResponse` JSON, 409 before `/scr`,
/// or 422 when the requested power is out of range
pub async fn post_operate(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<OperatingInputs>,
) -> Result<Json<OperateResponse>, ApiError> {
    let session = state.session.read().unwrap_or_else(PoisonError::into_inner);
    let point = session.operating_point(&inputs).map_err(reject)?;
    let curve = session
        .last_result()
        .map(|r| p_delta_curve(r.v_ll, r.total_r(), r.total_x(), DEFAULT_CURVE_POINTS))
        .unwrap_or_default()
        .into_iter()
        .map(|(d, p)| CurvePoint {
            delta_deg: d.to_degrees(),
            p_w: p,
        })
        .collect();
    Ok(Json(OperateResponse { point, curve }))
}
