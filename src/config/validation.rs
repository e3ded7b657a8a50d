//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, port valid)
//! - Check the registry URL is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::IpAddr;

use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check that `url` is an absolute http(s) URL.
pub fn check_registry_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Err(e.to_string()),
    }
}

pub fn check_ip_address(ip: &str) -> Result<(), String> {
    ip.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not an IP address", ip))
}

/// Validate a configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(message) = check_registry_url(&config.registry.url) {
        errors.push(ValidationError::new("registry.url", message));
    }

    if config.registry.app_name.trim().is_empty() {
        errors.push(ValidationError::new("registry.app_name", "must not be empty"));
    }
    if config.registry.heartbeat_interval_secs == 0 {
        errors.push(ValidationError::new(
            "registry.heartbeat_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.registry.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "registry.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.instance.port == 0 {
        errors.push(ValidationError::new("instance.port", "must not be 0"));
    }
    if let Some(ip) = &config.instance.ip_address {
        if let Err(message) = check_ip_address(ip) {
            errors.push(ValidationError::new("instance.ip_address", message));
        }
    }

    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::new("probe.timeout_secs", "must be greater than 0"));
    }
    if !config.probe.path.starts_with('/') {
        errors.push(ValidationError::new("probe.path", "must start with '/'"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
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
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ServiceConfig::default();
        config.registry.url = "registry:8761".into();
        config.registry.app_name = "  ".into();
        config.instance.port = 0;
        config.probe.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "registry.url",
                "registry.app_name",
                "instance.port",
                "probe.timeout_secs"
            ]
        );
    }

    #[test]
    fn test_rejects_bad_ip_override() {
        let mut config = ServiceConfig::default();
        config.instance.ip_address = Some("not-an-ip".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "instance.ip_address");
    }
}
