//! Registry data model and error definitions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status an instance advertises to the registry.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Up = 1,
    Down = 2,
    Starting = 3,
    OutOfService = 4,
    #[default]
    #[serde(other)]
    Unknown = 0,
}

impl From<u8> for InstanceStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => InstanceStatus::Up,
            2 => InstanceStatus::Down,
            3 => InstanceStatus::Starting,
            4 => InstanceStatus::OutOfService,
            _ => InstanceStatus::Unknown,
        }
    }
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Up => "UP",
            InstanceStatus::Down => "DOWN",
            InstanceStatus::Starting => "STARTING",
            InstanceStatus::OutOfService => "OUT_OF_SERVICE",
            InstanceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of data center the instance runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
pub enum DataCenterKind {
    #[default]
    MyOwn,
    Amazon,
}

impl DataCenterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCenterKind::MyOwn => "MyOwn",
            DataCenterKind::Amazon => "Amazon",
        }
    }
}

/// Stable identity of this process in the registry.
///
/// Heartbeat and deregistration locate the record by this pair only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub host_name: String,
    pub app_name: String,
}

impl InstanceKey {
    pub fn new(host_name: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            app_name: app_name.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.host_name)
    }
}

/// The record identifying this process to the registry.
///
/// Built once at startup; only the status changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDescriptor {
    host_name: String,
    ip_address: String,
    port: u16,
    app_name: String,
    virtual_address: String,
    status: InstanceStatus,
    data_center: DataCenterKind,
}

impl InstanceDescriptor {
    /// Create a descriptor in `STARTING` state. The virtual address defaults
    /// to the application name.
    pub fn new(
        host_name: impl Into<String>,
        ip_address: impl Into<String>,
        port: u16,
        app_name: impl Into<String>,
    ) -> Self {
        let app_name = app_name.into();
        Self {
            host_name: host_name.into(),
            ip_address: ip_address.into(),
            port,
            virtual_address: app_name.clone(),
            app_name,
            status: InstanceStatus::Starting,
            data_center: DataCenterKind::MyOwn,
        }
    }

    pub fn with_virtual_address(mut self, vip: impl Into<String>) -> Self {
        self.virtual_address = vip.into();
        self
    }

    pub fn with_data_center(mut self, kind: DataCenterKind) -> Self {
        self.data_center = kind;
        self
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn virtual_address(&self) -> &str {
        &self.virtual_address
    }

    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    pub fn data_center(&self) -> DataCenterKind {
        self.data_center
    }

    pub fn set_status(&mut self, status: InstanceStatus) {
        self.status = status;
    }

    /// Registry-side identifier of the instance record.
    pub fn instance_id(&self) -> &str {
        &self.host_name
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.host_name.clone(), self.app_name.clone())
    }
}

/// One instance as seen in a registry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceView {
    pub host_name: String,
    pub ip_address: String,
    pub port: u16,
    pub status: InstanceStatus,
}

/// Read-only snapshot of one registered application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationView {
    pub name: String,
    pub instances: Vec<InstanceView>,
}

impl ApplicationView {
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Errors talking to the discovery registry.
///
/// None of these are fatal to the process; the lifecycle manager logs them
/// and continues.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Connection refused, DNS failure, reset.
    #[error("registry unreachable: {0}")]
    Transport(String),

    #[error("registry request timed out after {0:?}")]
    Timeout(Duration),

    /// The registry answered with a non-success status.
    #[error("registry {operation} returned HTTP {status}")]
    UnexpectedStatus { operation: &'static str, status: u16 },

    /// Lease unknown to the registry (already expired or never registered).
    #[error("instance {0} is not registered")]
    NotRegistered(InstanceKey),

    #[error("could not decode registry response: {0}")]
    Decode(String),

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
