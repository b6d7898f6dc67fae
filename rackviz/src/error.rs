//! Error kinds recognized by the visualizer. Neither is fatal once running.

use thiserror::Error;

/// The render surface (terminal canvas) could not be set up.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("render surface unavailable: terminal reports {width}x{height}")]
    Unavailable { width: u16, height: u16 },
    #[error("terminal i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// A metrics fetch failed; the poller substitutes a synthetic sample.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint answered with status {0}")]
    Status(u16),
    #[error("malformed metrics payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("websocket closed by peer")]
    Closed,
    #[error("no answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("unsupported url scheme '{0}' (expected http, https, ws or wss)")]
    UnsupportedScheme(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
