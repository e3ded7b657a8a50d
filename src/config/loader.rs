//! Configuration loading from disk and environment.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{
    check_ip_address, check_registry_url, validate_config, ValidationError,
};

/// Registry base URL.
pub const ENV_REGISTRY_URL: &str = "EUREKA_URL";
/// Application name.
pub const ENV_APP_NAME: &str = "EUREKA_APP";
/// Heartbeat-and-sweep interval in seconds.
pub const ENV_HEARTBEAT_SECS: &str = "EUREKA_HEARTBEAT_SECS";
/// Listening and advertised port.
pub const ENV_PORT: &str = "PORT";
pub const ENV_INSTANCE_HOST: &str = "INSTANCE_HOST";
pub const ENV_INSTANCE_IP: &str = "INSTANCE_IP";
pub const ENV_PROBE_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// An environment value that was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredEnvVar {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for IgnoredEnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}: {}", self.key, self.value, self.reason)
    }
}

/// Effective configuration plus the environment values it rejected.
///
/// Rejections are reported through [`LoadedConfig::log_ignored`] once the
/// subscriber is installed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub ignored: Vec<IgnoredEnvVar>,
}

impl LoadedConfig {
    pub fn log_ignored(&self) {
        for var in &self.ignored {
            tracing::warn!(
                key = var.key,
                value = %var.value,
                reason = %var.reason,
                "Ignoring invalid environment value, keeping previous setting"
            );
        }
    }
}

/// Build the effective configuration: defaults, then the optional file,
/// then the process environment.
///
/// Only a bad config file is an error. Invalid environment values are
/// dropped and listed in [`LoadedConfig::ignored`].
pub fn load(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_from(path, |key| std::env::var(key).ok())
}

fn load_from<F>(path: Option<&Path>, lookup: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ServiceConfig::default(),
    };

    let ignored = apply_env_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(LoadedConfig { config, ignored })
}

fn read_config_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Unset and empty variables leave the current value in place. Values that
/// do not parse or would fail validation are skipped and returned.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Vec<IgnoredEnvVar>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ignored = Vec::new();
    type Check<'a> = &'a dyn Fn(&str) -> Result<(), String>;
    let mut get = |key: &'static str, check: Check<'_>| -> Option<String> {
        let value = lookup(key).filter(|v| !v.trim().is_empty())?;
        let value = value.trim().to_string();
        match check(&value) {
            Ok(()) => Some(value),
            Err(reason) => {
                ignored.push(IgnoredEnvVar { key, value, reason });
                None
            }
        }
    };

    if let Some(url) = get(ENV_REGISTRY_URL, &check_registry_url) {
        config.registry.url = url;
    }
    if let Some(app) = get(ENV_APP_NAME, &any_value) {
        config.registry.app_name = app;
    }
    if let Some(secs) = get(ENV_HEARTBEAT_SECS, &positive::<u64>) {
        config.registry.heartbeat_interval_secs = parse_checked(&secs);
    }
    if let Some(port) = get(ENV_PORT, &positive::<u16>) {
        config.instance.port = parse_checked(&port);
    }
    if let Some(host) = get(ENV_INSTANCE_HOST, &any_value) {
        config.instance.host_name = Some(host);
    }
    if let Some(ip) = get(ENV_INSTANCE_IP, &check_ip_address) {
        config.instance.ip_address = Some(ip);
    }
    if let Some(secs) = get(ENV_PROBE_TIMEOUT_SECS, &positive::<u64>) {
        config.probe.timeout_secs = parse_checked(&secs);
    }

    ignored
}

fn any_value(_: &str) -> Result<(), String> {
    Ok(())
}

fn positive<T>(value: &str) -> Result<(), String>
where
    T: FromStr + Default + PartialEq,
{
    match value.parse::<T>() {
        Ok(v) if v == T::default() => Err("must be greater than 0".to_string()),
        Ok(_) => Ok(()),
        Err(_) => Err("not a valid number".to_string()),
    }
}

/// Parse a value already accepted by [`positive`].
fn parse_checked<T: FromStr + Default>(value: &str) -> T {
    value.parse().unwrap_or_default()
}
