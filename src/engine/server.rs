//! Reloadable HTTP server.
//!
//! # Responsibilities
//! - Own the one live listener and the route table it serves
//! - Apply incoming models one at a time
//! - Hand over from the old listener to a new one on every reload
//! - Report bind and serve failures on the fatal stream
//!
//! # Reload sequence
//! ```text
//! Model received
//!     → build new route table (old listener still serving)
//!     → graceful shutdown of old listener (bounded by shutdown_timeout_secs)
//!     → bind same address, start serving new table
//! ```
//!
//! # Design Decisions
//! - Reloads are serialized in a single control loop
//! - The new table is built before the old listener stops, so the unbound
//!   window is only shutdown + rebind. It is short but not zero: requests
//!   arriving in that window are refused
//! - Tables are replaced wholesale, never mutated in place

use arc_swap::ArcSwap;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::HttpConfig;
use crate::engine::error::EngineError;
use crate::engine::handlers::build_router;
use crate::engine::listener;
use crate::model::{Info, Model};
use crate::observability::metrics;

const INBOX_BUFFER: usize = 16;
const FATAL_BUFFER: usize = 4;

/// HTTP engine whose route table follows the latest applied model.
pub struct ReloadableServer {
    addr: SocketAddr,
    identity: Info,
    config: HttpConfig,
    applied: Arc<ArcSwap<Model>>,
}

impl ReloadableServer {
    /// Create a server from its configuration. Nothing is bound yet.
    pub fn new(config: HttpConfig) -> Result<Self, EngineError> {
        let addr = listener::resolve(&config.bind_address)?;

        let prefix = &config.info_prefix;
        if prefix.is_empty() || prefix.contains(['/', '{', '}', '*']) {
            return Err(EngineError::InvalidPrefix(prefix.clone()));
        }

        Ok(Self {
            addr,
            identity: Info::engine(prefix.clone()),
            config,
            applied: Arc::new(ArcSwap::from_pointee(Model::empty())),
        })
    }

    pub fn identity(&self) -> &Info {
        &self.identity
    }

    /// Bind, start serving the engine identity and start the control loop.
    ///
    /// A failure to bind the initial listener is returned directly; every
    /// later failure arrives on [`ServerHandle::fatal`].
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<ServerHandle, EngineError> {
        let router = build_router(&self.identity, Model::empty(), &self.config);
        let listener = listener::bind(self.addr).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| EngineError::Bind {
                addr: self.addr,
                source,
            })?;

        tracing::info!(
            address = %local_addr,
            identity = %self.identity.code,
            "HTTP engine serving"
        );

        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_BUFFER);
        let (fatal_tx, fatal_rx) = mpsc::channel(FATAL_BUFFER);

        let live = Live::start(listener, router, fatal_tx.clone());
        let applied = Arc::clone(&self.applied);
        let task = tokio::spawn(self.control_loop(local_addr, live, inbox_rx, fatal_tx, shutdown));

        Ok(ServerHandle {
            inbox: inbox_tx,
            fatal: fatal_rx,
            local_addr,
            applied,
            task,
        })
    }

    async fn control_loop(
        self,
        addr: SocketAddr,
        mut live: Live,
        mut inbox: mpsc::Receiver<Model>,
        fatal: mpsc::Sender<EngineError>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut inbox_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                model = inbox.recv(), if inbox_open => {
                    let Some(model) = model else {
                        tracing::debug!("Model inbox closed, keeping current routes");
                        inbox_open = false;
                        continue;
                    };

                    let started = Instant::now();
                    match self.reload(addr, live, model, &fatal).await {
                        Ok(next) => {
                            metrics::record_reload("ok", started);
                            live = next;
                        }
                        Err(e) => {
                            metrics::record_reload("failed", started);
                            tracing::error!(error = %e, "Reload failed, engine is down");
                            let _ = fatal.send(e).await;
                            return;
                        }
                    }
                }
            }
        }

        tracing::info!("HTTP engine stopping");
        if let Err(e) = live.stop(self.shutdown_timeout()).await {
            tracing::warn!(error = %e, "Listener did not stop cleanly");
        }
    }

    async fn reload(
        &self,
        addr: SocketAddr,
        live: Live,
        model: Model,
        fatal: &mpsc::Sender<EngineError>,
    ) -> Result<Live, EngineError> {
        let points = model.len();
        let router = build_router(&self.identity, model.clone(), &self.config);

        live.stop(self.shutdown_timeout()).await?;
        let listener = listener::bind(addr).await?;
        let live = Live::start(listener, router, fatal.clone());

        self.applied.store(Arc::new(model));
        metrics::set_control_points(points);
        tracing::info!(address = %addr, points, "Engine reloaded");
        Ok(live)
    }

    fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.config.shutdown_timeout_secs)
    }
}

/// A listener serving one route table.
struct Live {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Live {
    fn start(listener: TcpListener, router: Router, fatal: mpsc::Sender<EngineError>) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await;

            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP engine stopped unexpectedly");
                let _ = fatal.send(EngineError::Serve(e)).await;
            }
        });

        Self { stop_tx, task }
    }

    /// Stop accepting, then wait for in-flight requests up to `timeout`.
    async fn stop(mut self, timeout: Duration) -> Result<(), EngineError> {
        let _ = self.stop_tx.send(());

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(EngineError::Shutdown(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "In-flight requests still running after drain timeout, aborting them"
                );
                self.task.abort();
                let _ = self.task.await;
                Ok(())
            }
        }
    }
}

/// Handle to a running [`ReloadableServer`].
pub struct ServerHandle {
    /// Models to apply, in order.
    pub inbox: mpsc::Sender<Model>,
    /// Fatal engine failures. The engine serves nothing after one arrives.
    pub fatal: mpsc::Receiver<EngineError>,
    local_addr: SocketAddr,
    applied: Arc<ArcSwap<Model>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address actually bound, stable across reloads.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The most recently applied model.
    pub fn applied(&self) -> Arc<Model> {
        self.applied.load_full()
    }

    /// Wait for the control loop to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Engine control loop panicked");
        }
    }
}
