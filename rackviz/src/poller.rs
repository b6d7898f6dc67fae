//! Metric poller: fetches one sample per period and publishes the latest one.
//!
//! A failed fetch never stalls the display: it is logged and replaced by a
//! synthetic sample derived from the wall clock.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, warn};
use url::Url;

use crate::error::PollError;
use crate::types::{MetricsPayload, Sample};
use crate::ws::{connect, request_metrics, WsStream};

pub const POLL_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000/metrics";

/// Milliseconds since the Unix epoch, as the animation clock.
pub fn wall_clock_ms() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

/// Fill in the conventional path when only an origin was given:
/// `/metrics` for HTTP, `/ws` for WebSocket.
pub fn endpoint_url(raw: &str) -> Result<Url, PollError> {
    let mut url = Url::parse(raw)?;
    let default_path = match url.scheme() {
        "http" | "https" => "/metrics",
        "ws" | "wss" => "/ws",
        other => return Err(PollError::UnsupportedScheme(other.to_string())),
    };
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(default_path);
    }
    Ok(url)
}

/// Where samples come from.
pub enum MetricsSource {
    Http {
        client: reqwest::Client,
        url: Url,
    },
    /// Persistent socket, reopened on the tick after a failure.
    Ws {
        url: Url,
        stream: Option<WsStream>,
    },
}

impl MetricsSource {
    pub fn from_url(raw: &str) -> Result<Self, PollError> {
        let url = endpoint_url(raw)?;
        Ok(match url.scheme() {
            "ws" | "wss" => MetricsSource::Ws { url, stream: None },
            _ => MetricsSource::Http {
                client: reqwest::Client::new(),
                url,
            },
        })
    }

    pub fn url(&self) -> &Url {
        match self {
            MetricsSource::Http { url, .. } | MetricsSource::Ws { url, .. } => url,
        }
    }

    pub async fn fetch(&mut self) -> Result<MetricsPayload, PollError> {
        match self {
            MetricsSource::Http { client, url } => {
                let resp = client.get(url.clone()).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(PollError::Status(status.as_u16()));
                }
                let body = resp.bytes().await?;
                Ok(serde_json::from_slice(&body)?)
            }
            MetricsSource::Ws { url, stream } => {
                if stream.is_none() {
                    *stream = Some(connect(url.as_str()).await?);
                }
                let Some(ws) = stream.as_mut() else {
                    return Err(PollError::Closed);
                };
                let res = request_metrics(ws).await;
                if res.is_err() {
                    // drop the socket so the next tick reconnects
                    *stream = None;
                }
                res
            }
        }
    }
}

/// Outcome of one poll tick, as shown in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub sample: Sample,
    /// Why the sample is synthetic, if it is.
    pub failure: Option<String>,
}

/// Fetch once, bounded by `limit`; fall back to a synthetic sample on any failure.
pub async fn poll_once(source: &mut MetricsSource, limit: Duration) -> PollReport {
    let res = match timeout(limit, source.fetch()).await {
        Ok(r) => r,
        Err(_) => {
            // a half-finished socket exchange can't be trusted any more
            if let MetricsSource::Ws { stream, .. } = source {
                *stream = None;
            }
            Err(PollError::Timeout(limit))
        }
    };
    match res {
        Ok(payload) => {
            debug!(cpu = payload.cpu, ram = payload.ram, "metrics sample");
            PollReport {
                sample: Sample::live(payload),
                failure: None,
            }
        }
        Err(e) => {
            warn!(url = %source.url(), error = %e, "error fetching metrics; using synthetic sample");
            PollReport {
                sample: Sample::synthetic(wall_clock_ms()),
                failure: Some(e.to_string()),
            }
        }
    }
}

/// Poll every `period` until the receiving side goes away. Ticks missed while
/// a fetch is outstanding are skipped rather than queued.
pub fn spawn_poller(
    mut source: MetricsSource,
    period: Duration,
    tx: watch::Sender<Option<PollReport>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let report = poll_once(&mut source, period).await;
            if tx.send(Some(report)).is_err() {
                break;
            }
        }
    })
}
