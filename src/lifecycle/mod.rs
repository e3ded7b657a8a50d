//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → resolve identity (identity.rs) → register → start listener
//!
//! Scheduler (scheduler.rs):
//!     every cadence → manager.tick() (manager.rs): heartbeat, then sweep
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → stop scheduler + listener → deregister → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: registration before the listener serves traffic
//! - Registry failures are logged, never fatal
//! - Deregistration is best-effort; lease expiry covers ungraceful exits

pub mod identity;
pub mod manager;
pub mod scheduler;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use manager::{HeartbeatOutcome, RegistryLifecycleManager, SweepOutcome, TickReport};
pub use scheduler::Scheduler;
pub use shutdown::Shutdown;
