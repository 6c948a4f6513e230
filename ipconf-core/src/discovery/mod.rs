//! Coordination-service boundary.
//!
//! The dispatcher only needs a prefix watch with set/delete callbacks and, for self
//! registration, a way to publish a value under a lease. Backends live behind
//! [`ServiceDiscovery`].

mod error;
#[cfg(feature = "etcd")]
mod etcd;
mod memory;
mod model;

#[cfg(test)]
mod tests;

pub use error::*;
#[cfg(feature = "etcd")]
pub use etcd::*;
pub use memory::*;
pub use model::*;

use crate::conf::RuntimeConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Receives watch notifications for one prefix.
///
/// Callbacks run on the backend's notification path and must not block or call back into
/// the backend.
pub trait WatchHandler: Send + Sync {
    fn on_set(&self, key: &str, value: &str);

    /// `value` is the last value stored under `key`, or empty when the backend has none.
    fn on_delete(&self, key: &str, value: &str);

    /// The watch on `prefix` has ended and will deliver nothing more.
    fn on_watch_lost(&self, prefix: &str, reason: &str);
}

#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Replay every key under `prefix` as `on_set`, then stream changes to `handler`.
    ///
    /// Returns once the watch is established.
    async fn watch_service(
        &self,
        prefix: &str,
        handler: Arc<dyn WatchHandler>,
    ) -> Result<(), DiscoveryError>;

    /// Publish `info` under `key`, kept alive for as long as the process runs.
    async fn register_service(
        &self,
        key: &str,
        info: &EndpointInfo,
        lease_ttl: Duration,
    ) -> Result<(), DiscoveryError>;

    async fn deregister_service(&self, key: &str) -> Result<(), DiscoveryError>;
}

/// Connect to the configured coordination backend.
#[cfg(feature = "etcd")]
pub async fn connect_discovery(
    config: &RuntimeConfig,
) -> Result<Arc<dyn ServiceDiscovery>, DiscoveryError> {
    let conf = &config.discovery;
    let discovery = EtcdDiscovery::connect(&conf.endpoints, conf.timeout()).await?;
    Ok(Arc::new(discovery))
}

/// Connect to the configured coordination backend.
///
/// Without the `etcd` feature only debug mode can run, on an in-process store fed by the
/// synthetic nodes.
#[cfg(not(feature = "etcd"))]
pub async fn connect_discovery(
    config: &RuntimeConfig,
) -> Result<Arc<dyn ServiceDiscovery>, DiscoveryError> {
    if !config.global.is_debug() {
        return Err(DiscoveryError::NoBackend {
            endpoints: config.discovery.endpoints.clone(),
        });
    }

    tracing::warn!(
        endpoints = ?config.discovery.endpoints,
        "built without the `etcd` feature; debug mode uses in-process discovery"
    );
    Ok(Arc::new(MemoryDiscovery::new()))
}
