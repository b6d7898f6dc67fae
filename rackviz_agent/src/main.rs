//! rackviz_agent: serves this host's CPU and RAM load to rackviz clients.

mod http;
mod metrics;
mod sampler;
mod state;
mod types;
mod ws;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::sampler::{spawn_sampler, SAMPLE_PERIOD};
use crate::state::AppState;

const DEFAULT_PORT: u16 = 5000;

/// `--port N`, `-p N` or `--port=N`; the long form wins when both are given.
fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

fn default_port() -> u16 {
    std::env::var("RACKVIZ_AGENT_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(http::metrics_handler))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let port = parse_port(std::env::args(), default_port());
    let state = AppState::new();
    let _sampler = spawn_sampler(state.clone(), SAMPLE_PERIOD);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "agent listening");
    println!("rackviz agent running at http://{bound}/metrics");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("agent")
            .chain(v.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn port_long_short_and_assign() {
        assert_eq!(parse_port(args(&["--port", "9001"]), 5000), 9001);
        assert_eq!(parse_port(args(&["-p", "9002"]), 5000), 9002);
        assert_eq!(parse_port(args(&["--port=9003"]), 5000), 9003);
        assert_eq!(parse_port(args(&["-p", "1", "--port", "2"]), 5000), 2);
        assert_eq!(parse_port(args(&[]), 5000), 5000);
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        assert_eq!(parse_port(args(&["--port", "http"]), 5000), 5000);
        assert_eq!(parse_port(args(&["-p", "70000"]), 5000), 5000);
        assert_eq!(parse_port(args(&["-p", "0"]), 5000), 0);
    }
}
