//! Remote (API-driven) change source.
//!
//! Placeholder for a source that pulls control points from external
//! endpoints. It starts, holds its streams open and never produces.

use std::collections::BTreeMap;
use tokio::sync::{broadcast, mpsc};

use crate::config::RemoteSentinelConfig;
use crate::model::Kind;
use crate::sentinel::error::SentinelError;
use crate::sentinel::{ChangeSource, SourceStreams};

#[derive(Debug, Clone, Default)]
pub struct RemoteWatcher {
    endpoints: BTreeMap<String, String>,
}

impl RemoteWatcher {
    pub fn new(endpoints: BTreeMap<String, String>) -> Self {
        Self { endpoints }
    }

    pub fn from_config(config: &RemoteSentinelConfig) -> Self {
        Self::new(config.endpoints.clone())
    }
}

impl ChangeSource for RemoteWatcher {
    fn kind(&self) -> Kind {
        Kind::Remote
    }

    fn watch(
        self: Box<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SourceStreams, SentinelError> {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);

        tracing::info!(
            endpoints = self.endpoints.len(),
            "Remote sentinel started (no polling implemented)"
        );

        // Keep both senders alive until shutdown so the streams stay open.
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drop((snapshot_tx, error_tx));
        });

        Ok(SourceStreams {
            snapshots: snapshot_rx,
            errors: error_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stub_never_produces() {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut streams = Box::new(RemoteWatcher::default())
            .watch(shutdown_tx.subscribe())
            .unwrap();

        let quiet = tokio::time::timeout(Duration::from_millis(100), streams.snapshots.recv()).await;
        assert!(quiet.is_err(), "stub must not emit");

        shutdown_tx.send(()).unwrap();
        assert!(streams.snapshots.recv().await.is_none());
        assert!(streams.errors.recv().await.is_none());
    }
}
