//! Minimal WebSocket client helpers for requesting samples from the agent.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::PollError;
use crate::types::MetricsPayload;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Connect to the agent and return the WS stream
pub async fn connect(url: &str) -> Result<WsStream, PollError> {
    let (ws, _) = connect_async(url).await?;
    Ok(ws)
}

// Send a "get_metrics" request and await a single JSON reply
pub async fn request_metrics(ws: &mut WsStream) -> Result<MetricsPayload, PollError> {
    ws.send(Message::Text("get_metrics".into())).await?;
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(json))) => return Ok(serde_json::from_str(&json)?),
            Some(Ok(Message::Binary(bytes))) => return Ok(serde_json::from_slice(&bytes)?),
            // control frames are handled by tungstenite; keep waiting for data
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(_))) | None => return Err(PollError::Closed),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}
