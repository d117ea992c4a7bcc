//! Server error types.
//!
//! Errors that reach the top of a connection task or server startup.
//! Per-command errors are mapped to wire tokens in the handler before
//! they get here; what remains is resource-level failure.

use thiserror::Error;

use store_core::CoreError;
use store_db::StoreDbError;

use crate::config::ConfigError;

/// Top-level server error.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreDbError),

    #[error("domain error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
