//! Sync engine error types.

use lotwatch_rest::RestError;
use lotwatch_ws::WsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Push channel error: {0}")]
    Ws(#[from] WsError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error("Sync engine has stopped")]
    EngineStopped,

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
