//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Check enabled sources carry their parameters
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::EngineConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("engine.http.info_prefix must be a single literal path segment, got {0:?}")]
    InvalidInfoPrefix(String),

    #[error("sentinel.file.dir must be set when the file sentinel is enabled")]
    EmptyWatchDir,
}

pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let http = &config.engine.http;

    if http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "engine.http.bind_address",
            value: http.bind_address.clone(),
        });
    }

    if http.info_prefix.is_empty() || http.info_prefix.contains(['/', '{', '}', '*']) {
        errors.push(ValidationError::InvalidInfoPrefix(http.info_prefix.clone()));
    }

    if http.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "engine.http.shutdown_timeout_secs",
        });
    }

    if http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "engine.http.request_timeout_secs",
        });
    }

    let file = &config.sentinel.file;
    if file.enabled && file.dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyWatchDir);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.engine.http.info_prefix = "a/b".into();
        config.engine.http.shutdown_timeout_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidInfoPrefix("a/b".into())));
    }

    #[test]
    fn test_disabled_file_sentinel_skips_dir_check() {
        let mut config = EngineConfig::default();
        config.sentinel.file.enabled = false;
        config.sentinel.file.dir = Default::default();
        assert!(validate_config(&config).is_ok());
    }
}
