// WebSocket handler: periodic averages push for one server

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, timeout};

use super::{AppState, LoadReport};
use crate::error::CoreError;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the WS client count on drop (connect = +1, drop = -1).
struct WsClientGuard(Arc<AtomicUsize>);

impl WsClientGuard {
    fn register(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self(count)
    }
}

impl Drop for WsClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_get(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(server): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_report(socket, state, &server).await {
            tracing::info!(server = %server, "Averages stream error: {}", e);
        }
    })
}

/// Sends `msg`; false when the client is gone or too slow.
async fn send_or_close(socket: &mut WebSocket, msg: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(msg)).await, Ok(Ok(())))
}

async fn stream_report(
    mut socket: WebSocket,
    state: AppState,
    server: &str,
) -> anyhow::Result<()> {
    let _guard = WsClientGuard::register(state.ws_clients.clone());
    tracing::info!(server = %server, "Client connected to averages stream");

    let mut tick = tokio::time::interval(Duration::from_millis(
        state.config.publishing.stream_frequency_ms,
    ));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // interval fires immediately; the first ping would race the first report
    ping_interval.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let json = match state.store.query_averages(server, &state.windows) {
                    Ok(averages) => serde_json::to_string(&LoadReport::from(&averages))?,
                    Err(e @ CoreError::NotFound { .. }) => {
                        let err = serde_json::json!({ "type": "error", "error": e.to_string() });
                        let _ = send_or_close(&mut socket, Message::Text(err.to_string().into())).await;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                };
                if !send_or_close(&mut socket, Message::Text(json.into())).await {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if !send_or_close(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        tracing::info!(server = %server, "Client left averages stream");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    Ok(())
}
