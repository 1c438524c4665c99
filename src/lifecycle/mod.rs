//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → build sentinels → start engine → start sentinels → wire streams
//!
//! Supervision (startup.rs):
//!     engine fatal error → stop everything → exit non-zero
//!     SIGTERM/SIGINT (signals.rs) → stop everything → exit zero
//!
//! Shutdown (shutdown.rs):
//!     trigger → sentinels drop their watch handles → engine drains and stops
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Crash-only: a failed engine is never restarted in-process
//! - Sentinel errors never reach this layer

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{Orchestrator, Running, StartupError};
