//! Write handle for outbound push channel requests.
//!
//! Requests are queued on a channel drained by the connection's message
//! loop, so the handle survives reconnects. Sending is refused unless the
//! channel is live.

use crate::connection::ConnectionState;
use crate::error::{WsError, WsResult};
use crate::message::ClientMessage;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::debug;

#[derive(Clone)]
pub struct WsWriteHandle {
    tx: mpsc::Sender<String>,
    state: watch::Receiver<ConnectionState>,
}

impl WsWriteHandle {
    pub fn new(tx: mpsc::Sender<String>, state: watch::Receiver<ConnectionState>) -> Self {
        Self { tx, state }
    }

    /// Whether the push channel is currently live.
    pub fn is_live(&self) -> bool {
        self.state.borrow().is_live()
    }

    /// Queue a request for the current connection.
    ///
    /// Returns [`WsError::NotLive`] without queueing anything when the
    /// channel is not live.
    pub async fn send(&self, msg: &ClientMessage) -> WsResult<()> {
        if !self.is_live() {
            return Err(WsError::NotLive);
        }

        let text = serde_json::to_string(msg)?;
        self.tx
            .send(text)
            .await
            .map_err(|_| WsError::ChannelClosed)?;

        debug!(kind = msg.kind(), "Outbound request queued");
        Ok(())
    }

    /// Queue a request without waiting for queue space.
    ///
    /// Fails with [`WsError::QueueFull`] instead of blocking when the
    /// connection loop is behind.
    pub fn try_send(&self, msg: &ClientMessage) -> WsResult<()> {
        if !self.is_live() {
            return Err(WsError::NotLive);
        }

        let text = serde_json::to_string(msg)?;
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => WsError::QueueFull,
            TrySendError::Closed(_) => WsError::ChannelClosed,
        })?;

        debug!(kind = msg.kind(), "Outbound request queued");
        Ok(())
    }
}
