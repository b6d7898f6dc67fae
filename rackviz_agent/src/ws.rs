//! WebSocket upgrade and per-connection handler. Answers each `get_metrics`
//! text frame with the cached sample.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::StreamExt;
use tracing::{debug, warn};

use crate::metrics::current_sample;
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    debug!("ws client connected");
    while let Some(Ok(msg)) = socket.next().await {
        match msg {
            Message::Text(text) if text == "get_metrics" => {
                let sample = current_sample(&state).await;
                match serde_json::to_string(&sample) {
                    Ok(js) => {
                        if socket.send(Message::Text(js)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "cannot encode sample"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    debug!("ws client gone");
}
