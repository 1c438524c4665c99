//! TCP listener setup.
//!
//! # Responsibilities
//! - Resolve the configured bind address
//! - Bind (and rebind after every reload) at the same address
//!
//! # Design Decisions
//! - The address resolved on the first bind is reused for every rebind,
//!   so a configured port 0 keeps the port the OS handed out
//! - Tokio sets SO_REUSEADDR on Unix, so a rebind is not blocked by
//!   connections of the previous listener lingering in TIME_WAIT

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::engine::error::EngineError;

/// Parse a configured bind address.
pub fn resolve(value: &str) -> Result<SocketAddr, EngineError> {
    value.parse().map_err(|e: std::net::AddrParseError| EngineError::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Bind a listener at `addr`.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, EngineError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| EngineError::Bind { addr, source })?;

    let local_addr = listener
        .local_addr()
        .map_err(|source| EngineError::Bind { addr, source })?;

    tracing::debug!(address = %local_addr, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("127.0.0.1:8080").unwrap().port(), 8080);
        assert!(matches!(
            resolve("localhost"),
            Err(EngineError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = bind(taken).await.unwrap_err();
        assert!(matches!(err, EngineError::Bind { addr, .. } if addr == taken));
    }
}
