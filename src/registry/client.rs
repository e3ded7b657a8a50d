//! Registry client capability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::registry::types::{ApplicationView, InstanceDescriptor, InstanceKey, RegistryResult};

/// Handle to a discovery server.
///
/// Implementations must not cache registry state across calls: every
/// `list_applications` reflects the registry at the time of the call.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Announce an instance.
    async fn register(&self, instance: &InstanceDescriptor) -> RegistryResult<()>;

    /// Renew the lease of a registered instance.
    async fn heartbeat(&self, key: &InstanceKey) -> RegistryResult<()>;

    /// Remove an instance record.
    async fn deregister(&self, key: &InstanceKey) -> RegistryResult<()>;

    /// Snapshot of every application and its instances, in registry order.
    async fn list_applications(&self) -> RegistryResult<Vec<ApplicationView>>;
}

#[async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for Arc<T> {
    async fn register(&self, instance: &InstanceDescriptor) -> RegistryResult<()> {
        (**self).register(instance).await
    }

    async fn heartbeat(&self, key: &InstanceKey) -> RegistryResult<()> {
        (**self).heartbeat(key).await
    }

    async fn deregister(&self, key: &InstanceKey) -> RegistryResult<()> {
        (**self).deregister(key).await
    }

    async fn list_applications(&self) -> RegistryResult<Vec<ApplicationView>> {
        (**self).list_applications().await
    }
}
