//! Reachability checking subsystem.
//!
//! # Data Flow
//! ```text
//! Sweep (sweep.rs):
//!     registry listing (ApplicationView snapshots)
//!     → one probe per instance (probe.rs)
//!     → SweepReport (one ProbeOutcome per instance, registry order)
//!
//! Probe (probe.rs):
//!     GET http://{ip}:{port}{path} with a per-probe timeout
//!     → any HTTP response = reachable
//! ```
//!
//! # Design Decisions
//! - Probes are independent: own timeout, own error, no shared state
//! - One slow instance never delays or skips the others
//! - Results are logged and recorded individually, never aggregated into failure

pub mod probe;
pub mod sweep;

pub use probe::{ProbeError, ProbeOutcome, Prober};
pub use sweep::{run_sweep, SweepReport};
