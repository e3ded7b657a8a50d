//! Registry lifecycle manager.
//!
//! # Responsibilities
//! - Register this instance (status UP) at bootstrap
//! - On every tick: renew the lease, then sweep all known instances
//! - Deregister at graceful shutdown
//!
//! # Design Decisions
//! - Every operation returns a typed result and logs at its own boundary;
//!   nothing here ever terminates the process
//! - The heartbeat is issued before the listing, so a registry listing
//!   failure never costs a lease renewal
//! - A lease the registry no longer knows is re-registered on the spot

use std::sync::atomic::{AtomicU8, Ordering};

use crate::health::{run_sweep, Prober, SweepReport};
use crate::observability::metrics;
use crate::registry::{
    InstanceDescriptor, InstanceKey, InstanceStatus, RegistryClient, RegistryError,
    RegistryResult,
};

/// How a heartbeat attempt ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// Lease renewed.
    Renewed,
    /// Registry had no lease; the instance was registered again.
    Reregistered,
}

/// What happened to the sweep step of a tick.
#[derive(Debug)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Listing applications failed; no probes were issued this tick.
    Skipped(RegistryError),
    Disabled,
}

impl SweepOutcome {
    pub fn report(&self) -> Option<&SweepReport> {
        match self {
            SweepOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of one heartbeat-and-sweep tick.
#[derive(Debug)]
pub struct TickReport {
    pub heartbeat: RegistryResult<HeartbeatOutcome>,
    pub sweep: SweepOutcome,
}

/// Keeps this process's registry membership consistent with its liveness.
pub struct RegistryLifecycleManager<C> {
    client: C,
    prober: Prober,
    /// Immutable identity; the live status is kept in `status`.
    descriptor: InstanceDescriptor,
    status: AtomicU8,
    sweep_enabled: bool,
}

impl<C: RegistryClient> RegistryLifecycleManager<C> {
    pub fn new(client: C, descriptor: InstanceDescriptor, prober: Prober) -> Self {
        let status = AtomicU8::new(descriptor.status() as u8);
        Self {
            client,
            prober,
            descriptor,
            status,
            sweep_enabled: true,
        }
    }

    /// Enable or disable the sweep step of each tick.
    pub fn with_sweep(mut self, enabled: bool) -> Self {
        self.sweep_enabled = enabled;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn status(&self) -> InstanceStatus {
        InstanceStatus::from(self.status.load(Ordering::Relaxed))
    }

    fn set_status(&self, status: InstanceStatus) {
        self.status.store(status as u8, Ordering::Relaxed);
    }

    /// Current descriptor, including the live status.
    pub fn descriptor(&self) -> InstanceDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.set_status(self.status());
        descriptor
    }

    pub fn key(&self) -> InstanceKey {
        self.descriptor.key()
    }

    /// Announce this instance as UP.
    ///
    /// Failure is logged and returned; the caller keeps serving either way.
    pub async fn register(&self) -> RegistryResult<()> {
        self.set_status(InstanceStatus::Up);
        let descriptor = self.descriptor();

        let result = self.client.register(&descriptor).await;
        metrics::record_registration(result.is_ok());

        match &result {
            Ok(()) => tracing::info!(
                app = %descriptor.app_name(),
                host = %descriptor.host_name(),
                ip = %descriptor.ip_address(),
                port = descriptor.port(),
                "Registered with registry"
            ),
            Err(e) => tracing::warn!(
                app = %descriptor.app_name(),
                host = %descriptor.host_name(),
                error = %e,
                "Registry registration failed, continuing unregistered"
            ),
        }
        result
    }

    /// Renew the lease, re-registering when the registry no longer knows us.
    pub async fn heartbeat(&self) -> RegistryResult<HeartbeatOutcome> {
        let key = self.key();

        let result = match self.client.heartbeat(&key).await {
            Ok(()) => {
                tracing::debug!(instance = %key, "Heartbeat sent");
                Ok(HeartbeatOutcome::Renewed)
            }
            Err(RegistryError::NotRegistered(_)) => {
                tracing::warn!(instance = %key, "Lease unknown to registry, registering again");
                self.register().await.map(|()| HeartbeatOutcome::Reregistered)
            }
            Err(e) => {
                tracing::warn!(instance = %key, error = %e, "Heartbeat failed");
                Err(e)
            }
        };

        metrics::record_heartbeat(result.is_ok());
        result
    }

    /// List the registry and probe every instance, this one included.
    pub async fn sweep(&self) -> SweepOutcome {
        if !self.sweep_enabled {
            return SweepOutcome::Disabled;
        }

        match self.client.list_applications().await {
            Ok(applications) => {
                SweepOutcome::Completed(run_sweep(&self.prober, &applications).await)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Could not list registry applications, skipping sweep"
                );
                SweepOutcome::Skipped(e)
            }
        }
    }

    /// One scheduled pass: heartbeat first, then the sweep.
    pub async fn tick(&self) -> TickReport {
        let heartbeat = self.heartbeat().await;
        let sweep = self.sweep().await;

        if let Some(report) = sweep.report() {
            tracing::debug!(
                probed = report.probed(),
                reachable = report.reachable(),
                duration_ms = report.duration.as_millis() as u64,
                "Registry tick complete"
            );
        }

        TickReport { heartbeat, sweep }
    }

    /// Remove this instance from the registry. Only the stable key is sent.
    ///
    /// Failure is logged and returned; shutdown proceeds either way.
    pub async fn deregister(&self) -> RegistryResult<()> {
        let key = self.key();
        tracing::info!(instance = %key, "Deregistering from registry");

        let result = self.client.deregister(&key).await;
        metrics::record_deregistration(result.is_ok());

        match &result {
            Ok(()) => {
                self.set_status(InstanceStatus::Down);
                tracing::info!(instance = %key, "Deregistered from registry");
            }
            Err(e) => tracing::warn!(
                instance = %key,
                error = %e,
                "Deregistration failed, relying on lease expiry"
            ),
        }
        result
    }
}
