//! Push channel error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Push channel is not live")]
    NotLive,

    #[error("Outbound channel closed")]
    ChannelClosed,

    #[error("Outbound queue full")]
    QueueFull,

    #[error("Frame decode error: {0}")]
    Decode(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WsResult<T> = Result<T, WsError>;
