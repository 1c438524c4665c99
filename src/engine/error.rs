//! Engine error types.

use std::net::SocketAddr;
use thiserror::Error;

/// Failures of the serving engine. Every variant is fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid bind address {value}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("invalid info prefix {0:?}: must be a single literal path segment")]
    InvalidPrefix(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to shut down listener: {0}")]
    Shutdown(String),
}
