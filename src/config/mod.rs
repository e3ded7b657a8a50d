//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Every field has a default; a missing env value is never an error
//! - An invalid env value is skipped and reported; only a bad file is fatal
//! - Environment wins over the file
//! - Validation reports all problems at once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError, IgnoredEnvVar, LoadedConfig};
pub use schema::ServiceConfig;
pub use schema::{InstanceConfig, ObservabilityConfig, ProbeConfig, RegistryConfig};
