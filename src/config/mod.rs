//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → handed by value to the orchestrator at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; control points are what hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    EngineConfig, EngineSection, FileSentinelConfig, HttpConfig, LogFormat, ObservabilityConfig,
    RemoteSentinelConfig, SentinelConfig,
};
pub use validation::{validate_config, ValidationError};
