//! Discovery registry subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle manager
//!     → RegistryClient (client.rs, capability trait)
//!     → EurekaClient (eureka.rs, REST/JSON)
//!     → discovery server
//!
//! listApplications:
//!     GET /apps → ApplicationView snapshots (types.rs)
//!     → health sweep (read-only)
//! ```
//!
//! # Design Decisions
//! - The client holds no registry state between calls
//! - Every call returns a typed `RegistryError`; logging policy lives in the caller
//! - Heartbeat and deregister only need the stable `InstanceKey`

pub mod client;
pub mod eureka;
pub mod types;

pub use client::RegistryClient;
pub use eureka::EurekaClient;
pub use types::{
    ApplicationView, DataCenterKind, InstanceDescriptor, InstanceKey, InstanceStatus,
    InstanceView, RegistryError, RegistryResult,
};
