//! Push/poll synchronization engine.
//!
//! Wires the push channel, the fallback poller and the reconciler together:
//!
//! ```text
//! ConnectionManager ──ServerMessage──┐
//!                                    ├──► SyncEngineTask ──► Reconciler ──► watch<Arc<Snapshot>>
//! FallbackPoller ─────PollUpdate─────┤                   └─────────────► watch<SyncStatus>
//! SyncHandle ─────────SyncCommand────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let client = Arc::new(ParkingApiClient::new(api_url, session)?);
//! let sync = SyncHandle::start(SyncConfig::new(ws_url), client);
//! let mut snapshots = sync.subscribe();
//! sync.select_lot(LotId::new(3)).await?;
//! sync.teardown().await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod poller;
pub mod status;

pub use config::{PollingConfig, SyncConfig};
pub use engine::{SyncCommand, SyncHandle};
pub use error::{SyncError, SyncResult};
pub use poller::{FallbackPoller, PollUpdate};
pub use status::SyncStatus;
