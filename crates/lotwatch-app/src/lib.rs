//! Live parking occupancy client.
//!
//! Keeps a local snapshot of lot occupancy in sync with the backend over a
//! push channel with REST fallback, and logs every published snapshot.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
