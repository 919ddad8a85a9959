// HTTP handlers: version, update, get, api/servers

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{ApiError, AppState, LoadReport};
use crate::models::SamplePayload;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// POST /update — records one sample.
pub(super) async fn update_handler(
    State(state): State<AppState>,
    Json(payload): Json<SamplePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (name, sample) = payload.into_sample(chrono::Utc::now());
    state
        .store
        .record_sample(&name, sample.cpu, sample.mem, sample.timestamp)?;
    tracing::debug!(server = %name, cpu = sample.cpu, mem = sample.mem, "Received an update");
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// GET /get/{server} — averages for each configured window.
pub(super) async fn get_handler(
    State(state): State<AppState>,
    Path(server): Path<String>,
) -> Result<Json<LoadReport>, ApiError> {
    let averages = state.store.query_averages(&server, &state.windows)?;
    tracing::debug!(server = %server, samples = averages.samples, "Returning averages");
    Ok(Json(LoadReport::from(&averages)))
}

/// GET /api/servers — known servers with their sample counts.
pub(super) async fn servers_handler(State(state): State<AppState>) -> impl IntoResponse {
    let servers = state.store.entities();
    let samples: usize = servers.iter().map(|s| s.samples).sum();
    Json(serde_json::json!({
        "entities": servers.len(),
        "samples": samples,
        "servers": servers,
    }))
}
