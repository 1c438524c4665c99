//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Serving engine settings.
    pub engine: EngineSection,

    /// Change sources feeding the engine.
    pub sentinel: SentinelConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Engine section (`[engine]`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineSection {
    pub http: HttpConfig,
}

/// HTTP engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Code under which the engine serves its own identity.
    pub info_prefix: String,

    /// Upper bound on draining in-flight requests during a reload.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            info_prefix: "engine".to_string(),
            shutdown_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Sentinel section (`[sentinel]`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    pub file: FileSentinelConfig,
    pub remote: RemoteSentinelConfig,
}

/// Filesystem change source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSentinelConfig {
    pub enabled: bool,

    /// Directory holding control point files.
    pub dir: PathBuf,

    /// Subscribe to sub-directories too. The initial scan is always recursive.
    pub recursive: bool,
}

impl Default for FileSentinelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("./points"),
            recursive: false,
        }
    }
}

/// Remote (API-driven) change source. Placeholder only.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RemoteSentinelConfig {
    pub enabled: bool,

    /// Named endpoints to pull control points from.
    pub endpoints: BTreeMap<String, String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
