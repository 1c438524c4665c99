//! Startup orchestration and top-level failure policy.
//!
//! # Responsibilities
//! - Build the sentinel registry and the engine from configuration
//! - Start the engine, then the sentinels, then wire them together
//! - Stop the process on the first fatal engine error
//!
//! # Design Decisions
//! - Construction errors surface before anything binds or watches
//! - The engine starts before the sentinels so the identity route is up
//!   before the first snapshot is applied
//! - No retry of a failed engine; restarting is an operator action

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, EngineConfig};
use crate::engine::{EngineError, ReloadableServer, ServerHandle};
use crate::lifecycle::Shutdown;
use crate::model::Model;
use crate::sentinel::{SentinelError, SentinelHub};

/// Errors that stop the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("sentinel: {0}")]
    Sentinel(#[from] SentinelError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),
}

/// Wires sentinels into the engine and owns the failure policy.
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Start every component and return once they are running.
    pub async fn start(self) -> Result<Running, StartupError> {
        let shutdown = Shutdown::new();

        let hub = SentinelHub::from_config(&self.config.sentinel)?;
        let server = ReloadableServer::new(self.config.engine.http.clone())?;

        let handle = server.run(shutdown.subscribe()).await?;
        let snapshots = match hub.run_all(&shutdown) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                shutdown.trigger();
                handle.join().await;
                return Err(e.into());
            }
        };

        let forwarder = tokio::spawn(forward(snapshots, handle.inbox.clone()));

        tracing::info!(address = %handle.local_addr(), "Engine and sentinels running");
        Ok(Running {
            server: handle,
            forwarder,
            shutdown,
        })
    }

    /// Start, then supervise until `signal` resolves or the engine fails.
    pub async fn run(self, signal: impl Future<Output = ()>) -> Result<(), StartupError> {
        self.start().await?.supervise(signal).await
    }
}

async fn forward(mut snapshots: mpsc::Receiver<Model>, inbox: mpsc::Sender<Model>) {
    while let Some(model) = snapshots.recv().await {
        if inbox.send(model).await.is_err() {
            break;
        }
    }
    tracing::debug!("Snapshot forwarding finished");
}

/// A started engine with its sentinels.
pub struct Running {
    server: ServerHandle,
    forwarder: JoinHandle<()>,
    shutdown: Shutdown,
}

impl Running {
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// The model the engine currently serves.
    pub fn applied(&self) -> Arc<Model> {
        self.server.applied()
    }

    /// Wait for `signal` or a fatal engine error, then stop everything.
    ///
    /// Returns the fatal error, if any, so the caller can exit non-zero.
    pub async fn supervise(mut self, signal: impl Future<Output = ()>) -> Result<(), StartupError> {
        let outcome = tokio::select! {
            fatal = self.server.fatal.recv() => match fatal {
                Some(e) => {
                    tracing::error!(error = %e, "Fatal engine error, shutting down");
                    Err(e.into())
                }
                None => {
                    tracing::error!("Engine stopped without reporting an error, shutting down");
                    Err(EngineError::Shutdown("engine stopped unexpectedly".to_string()).into())
                }
            },
            _ = signal => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
        };

        self.shutdown.trigger();
        self.forwarder.abort();
        self.server.join().await;
        outcome
    }
}
