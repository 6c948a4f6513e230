use crate::discovery::{DiscoveryError, EndpointInfo, ServiceDiscovery, WatchHandler};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// In-process key/value store with prefix watches.
///
/// Used when no coordination cluster is available (debug mode, tests). Leases never expire.
/// Notifications are delivered while the store lock is held, so every watcher sees changes
/// in the order they were made.
#[derive(Default)]
pub struct MemoryDiscovery {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    kv: BTreeMap<String, String>,
    watchers: Vec<(String, Arc<dyn WatchHandler>)>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.kv.insert(key.to_string(), value.to_string());

        for (prefix, handler) in &inner.watchers {
            if key.starts_with(prefix.as_str()) {
                handler.on_set(key, value);
            }
        }
    }

    /// Remove `key`, notifying watchers with its last value. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = inner.kv.remove(key) else {
            return false;
        };

        for (prefix, handler) in &inner.watchers {
            if key.starts_with(prefix.as_str()) {
                handler.on_delete(key, &previous);
            }
        }
        true
    }

    /// End every watch, telling each handler why. Later changes reach no one.
    pub fn close_watches(&self, reason: &str) {
        let watchers = std::mem::take(
            &mut self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .watchers,
        );

        for (prefix, handler) in watchers {
            handler.on_watch_lost(&prefix, reason);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .kv
            .get(key)
            .cloned()
    }

    pub fn get_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .kv
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl ServiceDiscovery for MemoryDiscovery {
    async fn watch_service(
        &self,
        prefix: &str,
        handler: Arc<dyn WatchHandler>,
    ) -> Result<(), DiscoveryError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        for (key, value) in inner.kv.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            handler.on_set(key, value);
        }

        inner.watchers.push((prefix.to_string(), handler));
        tracing::debug!(prefix, "in-process watch established");
        Ok(())
    }

    async fn register_service(
        &self,
        key: &str,
        info: &EndpointInfo,
        _lease_ttl: Duration,
    ) -> Result<(), DiscoveryError> {
        let value = info.to_json().map_err(|source| DiscoveryError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.put(key, &value);
        Ok(())
    }

    async fn deregister_service(&self, key: &str) -> Result<(), DiscoveryError> {
        if self.delete(key) {
            Ok(())
        } else {
            Err(DiscoveryError::NotRegistered {
                key: key.to_string(),
            })
        }
    }
}
