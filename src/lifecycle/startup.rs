//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve identity once
//! - Build the registry client, the prober and the lifecycle manager
//! - Register before serving begins
//! - Drain the scheduler and deregister at shutdown
//!
//! # Design Decisions
//! - Only configuration errors are fatal; registry trouble never blocks startup

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::health::{ProbeError, Prober};
use crate::lifecycle::identity::{self, Identity};
use crate::lifecycle::manager::RegistryLifecycleManager;
use crate::lifecycle::scheduler::Scheduler;
use crate::registry::{EurekaClient, InstanceDescriptor, RegistryClient, RegistryError};

/// Name under which the heartbeat-and-sweep task is scheduled.
pub const REGISTRY_TASK: &str = "registry-health";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("registry client: {0}")]
    Registry(#[from] RegistryError),

    #[error("probe client: {0}")]
    Probe(#[from] ProbeError),
}

/// Descriptor for this process from resolved identity and configuration.
pub fn build_descriptor(identity: &Identity, config: &ServiceConfig) -> InstanceDescriptor {
    let mut descriptor = InstanceDescriptor::new(
        identity.host_name.clone(),
        identity.ip_address.clone(),
        config.instance.port,
        config.registry.app_name.clone(),
    )
    .with_data_center(config.instance.data_center);

    if let Some(vip) = &config.instance.virtual_address {
        descriptor = descriptor.with_virtual_address(vip.clone());
    }
    descriptor
}

/// Build the manager talking to the configured Eureka registry.
pub fn build_manager(
    config: &ServiceConfig,
    identity: &Identity,
) -> Result<RegistryLifecycleManager<EurekaClient>, StartupError> {
    let client = EurekaClient::new(&config.registry.url, config.registry.request_timeout())?;
    let prober = Prober::new(&config.probe)?;
    let descriptor = build_descriptor(identity, config);

    tracing::info!(
        registry = %client.base_url(),
        app = %descriptor.app_name(),
        "Registry lifecycle configured"
    );

    Ok(RegistryLifecycleManager::new(client, descriptor, prober)
        .with_sweep(config.probe.enabled))
}

/// Schedule the heartbeat-and-sweep tick of `manager`.
pub fn schedule<C>(
    scheduler: &mut Scheduler,
    manager: Arc<RegistryLifecycleManager<C>>,
    cadence: Duration,
) where
    C: RegistryClient + 'static,
{
    scheduler.add(REGISTRY_TASK, cadence, move || {
        let manager = manager.clone();
        async move {
            manager.tick().await;
        }
    });
}

/// Resolve identity, build the manager and register (best-effort).
pub async fn bootstrap(
    config: &ServiceConfig,
) -> Result<Arc<RegistryLifecycleManager<EurekaClient>>, StartupError> {
    let identity = identity::resolve(&config.instance);
    let manager = Arc::new(build_manager(config, &identity)?);

    if config.registry.register_on_start {
        let _ = manager.register().await;
    }

    Ok(manager)
}

/// Stop the scheduled tick, then remove the lease.
///
/// Shutdown must already be triggered. Joining first guarantees no tick can
/// re-register after the deregistration.
pub async fn drain<C>(scheduler: Scheduler, manager: &RegistryLifecycleManager<C>)
where
    C: RegistryClient,
{
    scheduler.join().await;
    let _ = manager.deregister().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DataCenterKind, InstanceStatus};

    fn identity() -> Identity {
        Identity {
            host_name: "node-1".into(),
            ip_address: "10.0.0.9".into(),
        }
    }

    #[test]
    fn test_build_descriptor() {
        let mut config = ServiceConfig::default();
        config.registry.app_name = "ORDERS".into();
        config.instance.port = 9001;
        config.instance.data_center = DataCenterKind::Amazon;

        let d = build_descriptor(&identity(), &config);
        assert_eq!(d.host_name(), "node-1");
        assert_eq!(d.ip_address(), "10.0.0.9");
        assert_eq!(d.port(), 9001);
        assert_eq!(d.virtual_address(), "ORDERS");
        assert_eq!(d.data_center(), DataCenterKind::Amazon);
        assert_eq!(d.status(), InstanceStatus::Starting);
    }

    #[test]
    fn test_virtual_address_override() {
        let mut config = ServiceConfig::default();
        config.instance.virtual_address = Some("orders-vip".into());
        let d = build_descriptor(&identity(), &config);
        assert_eq!(d.virtual_address(), "orders-vip");
    }

    #[test]
    fn test_build_manager_rejects_bad_url() {
        let mut config = ServiceConfig::default();
        config.registry.url = "::not a url::".into();
        assert!(matches!(
            build_manager(&config, &identity()),
            Err(StartupError::Registry(RegistryError::InvalidUrl(_)))
        ));
    }

    #[tokio::test]
    async fn test_registry_tick_can_be_scheduled() {
        let mut config = ServiceConfig::default();
        config.registry.url = "http://127.0.0.1:1/eureka".into();
        let manager = Arc::new(build_manager(&config, &identity()).unwrap());

        let shutdown = crate::lifecycle::Shutdown::new();
        let mut scheduler = Scheduler::new(shutdown.clone());
        schedule(&mut scheduler, manager, Duration::from_secs(300));
        assert_eq!(scheduler.len(), 1);

        shutdown.trigger();
        scheduler.join().await;
    }
}
