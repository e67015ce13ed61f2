//! Push channel connection manager.
//!
//! Keeps at most one WebSocket open. When the connection is lost a single
//! reconnection attempt is scheduled after a fixed delay; there is no
//! attempt cap. `disconnect()` stops everything, including a pending retry.

use crate::error::{WsError, WsResult};
use crate::message::decode_frame;
use crate::message::ServerMessage;
use crate::ws_write_handle::WsWriteHandle;
use futures_util::{SinkExt, StreamExt};
use lotwatch_telemetry::Metrics;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex as TokioMutex};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay between losing the connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Fixed delay before each reconnection attempt.
    pub reconnect_delay_ms: u64,
    /// Capacity of the outbound request queue.
    pub outbound_buffer: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            outbound_buffer: 32,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing open and nothing scheduled.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Open and delivering frames.
    Live,
    /// Lost; the next attempt is scheduled.
    PendingRetry,
}

impl ConnectionState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::PendingRetry => "pending_retry",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: watch::Sender<ConnectionState>,
    message_tx: mpsc::Sender<ServerMessage>,
    outbound_tx: mpsc::Sender<String>,
    outbound_rx: Arc<TokioMutex<mpsc::Receiver<String>>>,
    shutdown_token: CancellationToken,
    /// Set while a connect loop is running.
    active: AtomicBool,
    /// Handshakes started since creation.
    attempts: AtomicU64,
}

impl ConnectionManager {
    /// Create a new connection manager with its own shutdown token.
    pub fn new(config: ConnectionConfig, message_tx: mpsc::Sender<ServerMessage>) -> Self {
        Self::with_shutdown_token(config, message_tx, CancellationToken::new())
    }

    /// Create a connection manager stopped by `shutdown_token`.
    pub fn with_shutdown_token(
        config: ConnectionConfig,
        message_tx: mpsc::Sender<ServerMessage>,
        shutdown_token: CancellationToken,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state,
            message_tx,
            outbound_tx,
            outbound_rx: Arc::new(TokioMutex::new(outbound_rx)),
            shutdown_token,
            active: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
        }
    }

    /// Get a write handle for outbound requests.
    pub fn write_handle(&self) -> WsWriteHandle {
        WsWriteHandle::new(self.outbound_tx.clone(), self.state.subscribe())
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Number of connection attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Tear down the connection and cancel any pending retry.
    ///
    /// Once called the manager will not connect again.
    pub fn disconnect(&self) {
        info!("Push channel teardown requested");
        self.shutdown_token.cancel();
    }

    /// Check if teardown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and keep the channel up until `disconnect()`.
    ///
    /// A second call while a loop is already running returns immediately
    /// without opening another connection.
    pub async fn connect(&self) -> WsResult<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("Push channel already open or opening, ignoring connect");
            return Ok(());
        }

        let result = self.connect_with_retry().await;
        self.active.store(false, Ordering::SeqCst);
        result
    }

    async fn connect_with_retry(&self) -> WsResult<()> {
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);

        loop {
            if self.is_shutdown() {
                self.set_state(ConnectionState::Disconnected);
                return Ok(());
            }

            self.set_state(ConnectionState::Connecting);

            let reason = match self.try_connect().await {
                Ok(()) => "closed",
                Err(e) => {
                    warn!(error = %e, "Push channel lost");
                    "error"
                }
            };

            if self.is_shutdown() {
                info!("Teardown after disconnect, not reconnecting");
                self.set_state(ConnectionState::Disconnected);
                return Ok(());
            }

            self.set_state(ConnectionState::PendingRetry);
            Metrics::ws_reconnect(reason);
            warn!(delay_ms = self.config.reconnect_delay_ms, reason, "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Teardown during retry wait, not reconnecting");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(&self) -> WsResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(url = %self.config.url, attempt, "Connecting to push channel");

        let handshake = connect_async_tls_with_config(self.config.url.as_str(), None, true, None);
        let (ws_stream, _response) = tokio::select! {
            result = handshake => result?,
            () = self.shutdown_token.cancelled() => return Ok(()),
        };
        let (mut write, mut read) = ws_stream.split();

        self.set_state(ConnectionState::Live);
        info!("Push channel live");

        loop {
            let outbound_recv = async { self.outbound_rx.lock().await.recv().await };

            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during teardown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_message(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            return Err(WsError::ConnectionClosed {
                                code: 1006,
                                reason: "Stream ended".to_string(),
                            });
                        }
                        _ => {}
                    }
                }

                outbound = outbound_recv => {
                    if let Some(text) = outbound {
                        write.send(Message::Text(text)).await?;
                    }
                }
            }
        }
    }

    async fn handle_text_message(&self, text: &str) {
        match decode_frame(text) {
            Ok(msg) => {
                Metrics::frame_decoded(msg.kind());
                if self.message_tx.send(msg).await.is_err() {
                    debug!("Message receiver dropped");
                }
            }
            Err(e) => {
                Metrics::frame_rejected();
                warn!(error = %e, len = text.len(), "Discarding malformed frame");
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
        Metrics::ws_state_set(state.as_str());
    }
}
