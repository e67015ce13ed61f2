//! Sync status published alongside the snapshot.

use lotwatch_ws::ConnectionState;

/// What presentation needs besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub connection: ConnectionState,
    /// A lot list has been written at least once.
    pub loaded: bool,
    /// Set when a pull failed before anything loaded.
    pub load_error: Option<String>,
}

impl SyncStatus {
    pub fn is_live(&self) -> bool {
        self.connection.is_live()
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            loaded: false,
            load_error: None,
        }
    }
}
