//! Hot-reloadable control point engine.
//!
//! Sentinels watch external sources of control point definitions and emit
//! complete models; the engine swaps its route table whenever a new model
//! arrives, without restarting the process.
//!
//! ```text
//!  watched dir ─▶ FileSystemWatcher ─┐
//!                                    ├─▶ SentinelHub ─▶ Orchestrator ─▶ ReloadableServer ─▶ clients
//!  (future API) ─▶ RemoteWatcher ────┘
//! ```

// Core subsystems
pub mod config;
pub mod engine;
pub mod model;
pub mod sentinel;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::EngineConfig;
pub use engine::ReloadableServer;
pub use lifecycle::{Orchestrator, Shutdown};
pub use model::{ControlPoint, Model};
pub use sentinel::{ChangeSource, SentinelHub};
