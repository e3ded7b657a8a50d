//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the optional
//! config file; environment overrides are applied on top by the loader.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::DataCenterKind;

/// Registry URL used when neither file nor environment provide one.
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8761/eureka";

/// Application name used when neither file nor environment provide one.
pub const DEFAULT_APP_NAME: &str = "POCKETBASE-SERVER";

/// Listening port used when neither file nor environment provide one.
pub const DEFAULT_PORT: u16 = 8090;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Discovery registry settings.
    pub registry: RegistryConfig,

    /// Identity this process advertises.
    pub instance: InstanceConfig,

    /// Reachability sweep settings.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Discovery registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry base URL (e.g., "http://localhost:8761/eureka").
    pub url: String,

    /// Application name to register under.
    pub app_name: String,

    /// Interval between heartbeat-and-sweep ticks, in seconds.
    pub heartbeat_interval_secs: u64,

    /// Timeout for each registry call, in seconds.
    pub request_timeout_secs: u64,

    /// Register at startup.
    pub register_on_start: bool,
}

impl RegistryConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            heartbeat_interval_secs: 300,
            request_timeout_secs: 10,
            register_on_start: true,
        }
    }
}

/// Instance identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InstanceConfig {
    /// Port the host server listens on and advertises.
    pub port: u16,

    /// Bind host for the host server.
    pub bind_host: String,

    /// Host name to advertise instead of the detected one.
    pub host_name: Option<String>,

    /// IP address to advertise instead of the detected one.
    pub ip_address: Option<String>,

    /// Virtual address; defaults to the application name.
    pub virtual_address: Option<String>,

    /// Data center kind reported to the registry.
    pub data_center: DataCenterKind,
}

impl InstanceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_host: "0.0.0.0".to_string(),
            host_name: None,
            ip_address: None,
            virtual_address: None,
            data_center: DataCenterKind::MyOwn,
        }
    }
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Enable the sweep step of each tick.
    pub enabled: bool,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Probe instances concurrently instead of one after another.
    pub concurrent: bool,

    /// Path requested on each instance.
    pub path: String,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
            concurrent: true,
            path: "/".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Log as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "registry_lifecycle=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.registry.url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.registry.app_name, "POCKETBASE-SERVER");
        assert_eq!(config.registry.heartbeat_interval(), Duration::from_secs(300));
        assert_eq!(config.instance.port, 8090);
        assert_eq!(config.probe.timeout(), Duration::from_secs(10));
        assert!(config.probe.concurrent);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [registry]
            app_name = "ORDERS"

            [instance]
            port = 9001
            data_center = "Amazon"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.app_name, "ORDERS");
        assert_eq!(config.registry.url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.instance.port, 9001);
        assert_eq!(config.instance.bind_address(), "0.0.0.0:9001");
        assert_eq!(config.instance.data_center, DataCenterKind::Amazon);
        assert_eq!(config.probe, ProbeConfig::default());
    }
}
