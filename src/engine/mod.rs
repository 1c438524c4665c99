//! Serving engine subsystem.
//!
//! # Data Flow
//! ```text
//! Model (from sentinels)
//!     → server.rs (serialized control loop)
//!     → handlers.rs (route table: engine identity + one route per point)
//!     → middleware.rs (request id, version header, timeout, tracing)
//!     → listener.rs (rebind at the same address)
//!     → clients observe the new routes
//! ```

pub mod error;
pub mod handlers;
pub mod listener;
pub mod middleware;
pub mod server;

pub use error::EngineError;
pub use handlers::{build_router, info_path, INFO_PATH};
pub use middleware::ENGINE_HEADER;
pub use server::{ReloadableServer, ServerHandle};
