// HTTP + WebSocket routes

mod http;
mod report;
mod ws;

pub use report::{LoadReport, WindowReport};

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::models::WindowSpec;
use crate::store::EntityStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<EntityStore>,
    pub(crate) windows: Arc<[WindowSpec]>,
    pub(crate) ws_clients: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    store: Arc<EntityStore>,
    windows: Vec<WindowSpec>,
    ws_clients: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        store,
        windows: windows.into(),
        ws_clients,
        config,
    };
    Router::new()
        .route("/", get(|| async { "serverload: send load to /update, read it from /get/{server}" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/update", post(http::update_handler)) // POST /update
        .route("/get/{server}", get(http::get_handler)) // GET /get/{server}
        .route("/api/servers", get(http::servers_handler)) // GET /api/servers
        .route("/ws/get/{server}", get(ws::ws_get)) // WS /ws/get/{server}
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Maps store errors to HTTP status + JSON body.
#[derive(Debug)]
pub(crate) struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        };
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
