//! Service registry lifecycle library.
//!
//! Keeps one process's membership in a Eureka-style discovery registry
//! consistent with its liveness, and periodically probes every registered
//! instance for reachability.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{RegistryLifecycleManager, Shutdown};
pub use registry::{EurekaClient, RegistryClient};
