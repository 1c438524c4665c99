//! Sentinel subsystem: change sources and the hub that merges them.
//!
//! # Data Flow
//! ```text
//! file events ─▶ FileSystemWatcher ─┐
//!                                   ├─▶ SentinelHub ─▶ merged Model stream ─▶ engine
//! (future API) ─▶ RemoteWatcher ────┘        │
//!                                            └─▶ errors logged, never forwarded
//! ```
//!
//! # Design Decisions
//! - Every source emits complete snapshots; the hub never deduplicates
//! - One forwarding task per source keeps per-source ordering
//! - No ordering across sources; last snapshot received wins downstream
//! - Sources are consumed by `run_all`, so each starts exactly once

pub mod digest;
pub mod error;
pub mod file;
pub mod record;
pub mod remote;

pub use error::SentinelError;
pub use file::{FileSystemWatcher, FsChange};
pub use record::{FileIndex, FileRecord, Protocol};
pub use remote::RemoteWatcher;

use std::collections::BTreeMap;
use tokio::sync::{broadcast, mpsc};

use crate::config::SentinelConfig;
use crate::lifecycle::Shutdown;
use crate::model::{Kind, Model};
use crate::observability::metrics;

const MERGED_BUFFER: usize = 16;

/// Outbound streams of a running source.
#[derive(Debug)]
pub struct SourceStreams {
    pub snapshots: mpsc::Receiver<Model>,
    pub errors: mpsc::Receiver<SentinelError>,
}

/// A watcher over one external source of control points.
pub trait ChangeSource: Send + std::fmt::Debug {
    fn kind(&self) -> Kind;

    /// Start watching on background tasks and return immediately.
    ///
    /// Errors returned here mean the source could not start. The source
    /// stops and closes its streams once `shutdown` fires.
    fn watch(
        self: Box<Self>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<SourceStreams, SentinelError>;
}

/// Registry of enabled sources, keyed by name.
#[derive(Debug, Default)]
pub struct SentinelHub {
    sources: BTreeMap<String, Box<dyn ChangeSource>>,
}

impl SentinelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the enabled sections of the configuration.
    pub fn from_config(config: &SentinelConfig) -> Result<Self, SentinelError> {
        let mut hub = Self::new();
        if config.file.enabled {
            hub.register("file", Box::new(FileSystemWatcher::from_config(&config.file)?));
        }
        if config.remote.enabled {
            hub.register("remote", Box::new(RemoteWatcher::from_config(&config.remote)));
        }
        Ok(hub)
    }

    /// Add a source, replacing any previous source of the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: Box<dyn ChangeSource>,
    ) -> Option<Box<dyn ChangeSource>> {
        self.sources.insert(name.into(), source)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Start every source and merge their snapshots into one stream.
    ///
    /// Fails if any source cannot start. Source errors after startup are
    /// logged here and never reach the returned stream.
    pub fn run_all(self, shutdown: &Shutdown) -> Result<mpsc::Receiver<Model>, SentinelError> {
        let (merged_tx, merged_rx) = mpsc::channel(MERGED_BUFFER);

        if self.is_empty() {
            tracing::warn!("No sentinels enabled, serving engine identity only");
        } else {
            tracing::debug!(sentinels = self.len(), "Starting sentinels");
        }

        for (name, source) in self.sources {
            let kind = source.kind();
            let streams = source.watch(shutdown.subscribe())?;
            tracing::info!(sentinel = %name, kind = %kind, "Sentinel running");
            tokio::spawn(forward(name, streams, merged_tx.clone()));
        }

        Ok(merged_rx)
    }
}

async fn forward(name: String, mut streams: SourceStreams, merged: mpsc::Sender<Model>) {
    let mut errors_open = true;

    loop {
        tokio::select! {
            snapshot = streams.snapshots.recv() => {
                let Some(model) = snapshot else {
                    break;
                };
                metrics::record_snapshot(&name);
                tracing::debug!(sentinel = %name, points = model.len(), "Snapshot received");
                if merged.send(model).await.is_err() {
                    break;
                }
            }
            error = streams.errors.recv(), if errors_open => match error {
                Some(e) => {
                    metrics::record_sentinel_error(&name);
                    tracing::warn!(sentinel = %name, error = %e, "Sentinel error");
                }
                None => errors_open = false,
            },
        }
    }

    tracing::info!(sentinel = %name, "Sentinel stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControlPoint, ControlPointInfo};
    use std::time::Duration;

    /// Source that replays canned snapshots and errors, then idles.
    #[derive(Debug)]
    struct Scripted {
        snapshots: Vec<Model>,
        errors: usize,
    }

    impl ChangeSource for Scripted {
        fn kind(&self) -> Kind {
            Kind::Remote
        }

        fn watch(
            self: Box<Self>,
            mut shutdown: broadcast::Receiver<()>,
        ) -> Result<SourceStreams, SentinelError> {
            let (snapshot_tx, snapshot_rx) = mpsc::channel(8);
            let (error_tx, error_rx) = mpsc::channel(8);
            tokio::spawn(async move {
                for _ in 0..self.errors {
                    let _ = error_tx
                        .send(SentinelError::EventError {
                            details: "boom".into(),
                        })
                        .await;
                }
                for model in self.snapshots {
                    let _ = snapshot_tx.send(model).await;
                }
                let _ = shutdown.recv().await;
            });
            Ok(SourceStreams {
                snapshots: snapshot_rx,
                errors: error_rx,
            })
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl ChangeSource for Broken {
        fn kind(&self) -> Kind {
            Kind::File
        }

        fn watch(
            self: Box<Self>,
            _shutdown: broadcast::Receiver<()>,
        ) -> Result<SourceStreams, SentinelError> {
            Err(SentinelError::InitFailed {
                reason: "no inotify".into(),
            })
        }
    }

    fn model(codes: &[&str]) -> Model {
        codes
            .iter()
            .map(|code| {
                ControlPoint::new(ControlPointInfo {
                    name: code.to_string(),
                    code: code.to_string(),
                    version: String::new(),
                    desc: String::new(),
                    kind: Kind::Remote,
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_merges_sources_and_swallows_errors() {
        let shutdown = Shutdown::new();
        let mut hub = SentinelHub::new();
        hub.register(
            "first",
            Box::new(Scripted {
                snapshots: vec![model(&["a"]), model(&["a", "b"])],
                errors: 3,
            }),
        );
        hub.register(
            "second",
            Box::new(Scripted {
                snapshots: vec![model(&["x"])],
                errors: 0,
            }),
        );

        let mut merged = hub.run_all(&shutdown).unwrap();
        let mut received = Vec::new();
        for _ in 0..3 {
            let m = tokio::time::timeout(Duration::from_secs(2), merged.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(m);
        }

        // Per-source order is preserved.
        let first: Vec<_> = received.iter().filter(|m| m.contains("a")).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].len(), 1);
        assert_eq!(first[1].len(), 2);
        assert!(received.iter().any(|m| m.contains("x")));

        // Errors are never forwarded as snapshots.
        let extra = tokio::time::timeout(Duration::from_millis(100), merged.recv()).await;
        assert!(extra.is_err());

        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_start_failure_propagates() {
        let shutdown = Shutdown::new();
        let mut hub = SentinelHub::new();
        hub.register("broken", Box::new(Broken));

        let err = hub.run_all(&shutdown).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_config_respects_enable_flags() {
        let mut config = SentinelConfig::default();
        config.file.enabled = false;
        config.remote.enabled = true;

        let hub = SentinelHub::from_config(&config).unwrap();
        assert_eq!(hub.names().collect::<Vec<_>>(), vec!["remote"]);
    }

    #[test]
    fn test_from_config_rejects_empty_dir() {
        let mut config = SentinelConfig::default();
        config.file.dir = Default::default();

        let err = SentinelHub::from_config(&config).unwrap_err();
        assert!(matches!(err, SentinelError::InvalidConfig { .. }));
    }
}
