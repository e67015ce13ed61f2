//! Mock push channel server.
//!
//! Accepts WebSocket connections, records every connection time and every
//! text frame received, answers `get_lot_spots` and `get_status`, and lets
//! the test push arbitrary frames to every connected client.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// How the server treats each connection.
#[derive(Debug, Clone, Default)]
pub struct MockWsBehavior {
    /// Close right after the handshake.
    pub drop_after_handshake: bool,
    /// Frames sent as soon as a connection opens.
    pub greeting: Vec<String>,
    /// Reply to `get_status`.
    pub status_reply: Option<String>,
}

impl MockWsBehavior {
    pub fn greeting(frames: Vec<String>) -> Self {
        Self {
            greeting: frames,
            ..Default::default()
        }
    }

    pub fn dropping() -> Self {
        Self {
            drop_after_handshake: true,
            ..Default::default()
        }
    }
}

struct Shared {
    behavior: MockWsBehavior,
    received: Mutex<Vec<String>>,
    connections: Mutex<Vec<Instant>>,
    push: broadcast::Sender<String>,
}

pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    shared: Arc<Shared>,
}

impl MockWsServer {
    /// Start on an available port.
    pub async fn start(behavior: MockWsBehavior) -> Self {
        Self::start_on("127.0.0.1:0".parse().unwrap(), behavior).await
    }

    /// Start on a specific address.
    pub async fn start_on(addr: SocketAddr, behavior: MockWsBehavior) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (push, _) = broadcast::channel(64);
        let shared = Arc::new(Shared {
            behavior,
            received: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
            push,
        });
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let accept_shared = shared.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(stream, accept_shared.clone()));
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            shared,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws/parking/", self.addr)
    }

    pub async fn connection_count(&self) -> usize {
        self.shared.connections.lock().await.len()
    }

    pub async fn connection_times(&self) -> Vec<Instant> {
        self.shared.connections.lock().await.clone()
    }

    pub async fn received_messages(&self) -> Vec<Value> {
        self.shared
            .received
            .lock()
            .await
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Send a frame to every open connection. Returns how many got it.
    pub fn push(&self, frame: impl Into<String>) -> usize {
        self.shared.push.send(frame.into()).unwrap_or(0)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<Shared>) {
    shared.connections.lock().await.push(Instant::now());

    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {e}");
            return;
        }
    };

    if shared.behavior.drop_after_handshake {
        let _ = ws.close(None).await;
        return;
    }

    let mut push_rx = shared.push.subscribe();
    let (mut write, mut read) = ws.split();

    for frame in &shared.behavior.greeting {
        if write.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    shared.received.lock().await.push(text.clone());
                    if let Some(reply) = reply_to(&text, &shared.behavior) {
                        let _ = write.send(Message::Text(reply)).await;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
            Ok(frame) = push_rx.recv() => {
                if write.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn reply_to(text: &str, behavior: &MockWsBehavior) -> Option<String> {
    let parsed: Value = serde_json::from_str(text).ok()?;
    match parsed.get("type")?.as_str()? {
        "get_lot_spots" => {
            let lot_id = parsed.get("lot_id")?.clone();
            Some(
                json!({
                    "type": "lot_spots",
                    "lot_id": lot_id,
                    "data": [
                        {"spot_id": 1, "available": true},
                        {"spot_id": 2, "available": false}
                    ]
                })
                .to_string(),
            )
        }
        "get_status" => behavior.status_reply.clone(),
        _ => None,
    }
}
