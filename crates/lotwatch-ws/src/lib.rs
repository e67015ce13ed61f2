//! Push channel client for the lotwatch occupancy feed.
//!
//! Provides:
//! - A connection manager with fixed-delay, uncapped reconnection
//! - Frame decoding into a closed set of typed server messages
//! - A write handle for outbound requests while the channel is live

pub mod connection;
pub mod error;
pub mod message;
pub mod ws_write_handle;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use message::{decode_frame, ClientMessage, LotRecord, ServerMessage, SpotRecord, SpotUpdate};
pub use ws_write_handle::WsWriteHandle;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
