//! Reachability probe of a single instance.
//!
//! # Responsibilities
//! - Build the probe URL from a registry listing entry
//! - Issue one bounded GET and classify the result
//! - Log the result in the operator-facing `APP/host` form

use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time;

use crate::config::ProbeConfig;
use crate::registry::InstanceView;

const USER_AGENT: &str = "registry-lifecycle-probe";

/// Why a single instance could not be reached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(String),

    /// Listing entry has neither an IP nor a host name, or no port.
    #[error("instance has no usable address")]
    NoAddress,
}

/// Result of probing one instance.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub app: String,
    pub host: String,
    pub url: String,
    /// HTTP status on success.
    pub result: Result<u16, ProbeError>,
    pub elapsed: Duration,
    /// Timeout the probe ran with, for reporting.
    pub timeout: Duration,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        self.result.is_ok()
    }

    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().copied()
    }

    /// Emit the per-instance log line.
    pub fn log(&self) {
        match &self.result {
            Ok(status) => tracing::info!(
                app = %self.app,
                host = %self.host,
                status = *status,
                elapsed_ms = self.elapsed.as_millis() as u64,
                "{}", self
            ),
            Err(e) => tracing::warn!(
                app = %self.app,
                host = %self.host,
                url = %self.url,
                error = %e,
                "{}", self
            ),
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(status) => write!(f, "{}/{} reachable (status {})", self.app, self.host, status),
            Err(e) => write!(
                f,
                "{}/{} inaccessible (timeout {:?}): {}",
                self.app, self.host, self.timeout, e
            ),
        }
    }
}

/// Issues reachability probes with a shared, immutable HTTP client.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
    path: String,
    concurrent: bool,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            path: config.path.clone(),
            concurrent: config.concurrent,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// URL probed for `instance`, or `None` if the listing has no address.
    pub fn target_url(&self, instance: &InstanceView) -> Option<String> {
        if instance.port == 0 {
            return None;
        }
        let host = if !instance.ip_address.is_empty() {
            match instance.ip_address.parse::<IpAddr>() {
                Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
                _ => instance.ip_address.clone(),
            }
        } else if !instance.host_name.is_empty() {
            instance.host_name.clone()
        } else {
            return None;
        };
        Some(format!("http://{}:{}{}", host, instance.port, self.path))
    }

    /// Probe one instance of `app`. Never fails; the outcome carries the error.
    pub async fn probe(&self, app: &str, instance: &InstanceView) -> ProbeOutcome {
        let started = Instant::now();
        let url = self.target_url(instance);

        let result = match &url {
            Some(url) => self.request(url).await,
            None => Err(ProbeError::NoAddress),
        };

        ProbeOutcome {
            app: app.to_string(),
            host: instance.host_name.clone(),
            url: url.unwrap_or_default(),
            result,
            elapsed: started.elapsed(),
            timeout: self.timeout,
        }
    }

    async fn request(&self, url: &str) -> Result<u16, ProbeError> {
        let response_future = self.client.get(url).send();

        match time::timeout(self.timeout, response_future).await {
            Ok(Ok(response)) => Ok(response.status().as_u16()),
            Ok(Err(e)) if e.is_timeout() => Err(ProbeError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(ProbeError::Request(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}
