//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] lotwatch_telemetry::TelemetryError),

    #[error("REST error: {0}")]
    Rest(#[from] lotwatch_rest::RestError),

    #[error("Sync error: {0}")]
    Sync(#[from] lotwatch_sync::SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
