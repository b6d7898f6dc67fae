//! End-to-end: start the agent and read samples over HTTP and WebSocket.
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct Agent(Child);

impl Drop for Agent {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn start_agent() -> (Agent, u16) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_rackviz_agent"))
        .args(["-p", "0"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn agent");
    let stdout = child.stdout.take().expect("stdout piped");
    let agent = Agent(child);
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line).unwrap();
    let port = line
        .rsplit(':')
        .next()
        .and_then(|tail| tail.split('/').next())
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or_else(|| panic!("no port in {line:?}"));
    (agent, port)
}

fn check_sample(v: &serde_json::Value) {
    let cpu = v["cpu"].as_f64().expect("cpu");
    let ram = v["ram"].as_f64().expect("ram");
    let ts = v["timestamp"].as_f64().expect("timestamp");
    assert!((0.0..=100.0).contains(&cpu), "cpu {cpu}");
    assert!((0.0..=100.0).contains(&ram), "ram {ram}");
    assert!(ts > 1.6e9, "timestamp {ts}");
}

#[test]
fn http_metrics_returns_percentages() {
    let (_agent, port) = start_agent();
    let mut sock = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    sock.write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .unwrap();
    let mut resp = String::new();
    sock.read_to_string(&mut resp).unwrap();

    assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("content-type: application/json"));
    let body = resp.split("\r\n\r\n").nth(1).expect("body");
    let v: serde_json::Value = serde_json::from_str(body).expect("json body");
    check_sample(&v);
}

#[test]
fn unknown_path_is_404() {
    let (_agent, port) = start_agent();
    let mut sock = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    sock.write_all(b"GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .unwrap();
    let mut resp = String::new();
    sock.read_to_string(&mut resp).unwrap();
    assert!(resp.starts_with("HTTP/1.1 404"), "{resp}");
}

#[tokio::test]
async fn ws_answers_get_metrics() {
    let (_agent, port) = start_agent();
    let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
        .await
        .expect("ws connect");
    for _ in 0..2 {
        ws.send(Message::Text("get_metrics".into())).await.unwrap();
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("reply in time")
            .expect("stream open")
            .expect("frame");
        let Message::Text(text) = msg else {
            panic!("expected text frame, got {msg:?}");
        };
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        check_sample(&v);
    }
}
