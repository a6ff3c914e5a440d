//! REST API over a shared calculation session.
//!
//! Endpoints:
//! - `GET /state`: scenario and current snapshots
//! - `GET /presets`: built-in grid ratings
//! - `POST /scr`, `POST /line`: run a calculation from text inputs
//! - `POST /sweep`, `GET /sweep.csv`: δ-sweep of the last SCR result
//! - `POST /operate`: operating point and P-δ curve

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::routing::{get, post};

use crate::config::ScenarioConfig;
use crate::session::Session;

pub use types::{CurvePoint, ErrorResponse, OperateResponse, PresetRecord, StateResponse, SweepRequest};

/// Application state shared across all request handlers.
///
/// Calculations replace snapshots in `session`, so it sits behind a lock.
pub struct AppState {
    /// Scenario used for defaults (sweep range, per-unit mode).
    pub scenario: ScenarioConfig,
    /// Calculation snapshots.
    pub session: RwLock<Session>,
}

impl AppState {
    pub fn new(scenario: ScenarioConfig) -> Self {
        let session = Session::new(scenario.options.per_unit);
        Self {
            scenario,
            session: RwLock::new(session),
        }
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/presets", get(handlers::get_presets))
        .route("/scr", post(handlers::post_scr))
        .route("/line", post(handlers::post_line))
        .route("/sweep", post(handlers::post_sweep))
        .route("/sweep.csv", get(handlers::get_sweep_csv))
        .route("/operate", post(handlers::post_operate))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}
