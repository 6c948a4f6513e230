use crate::discovery::{DiscoveryError, EndpointInfo, ServiceDiscovery, WatchHandler};
use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, EventType, GetOptions, PutOptions, WatchOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// etcd-backed discovery: prefix watches with previous values, lease-bound registration.
pub struct EtcdDiscovery {
    client: Client,
    leases: Mutex<HashMap<String, i64>>,
}

impl EtcdDiscovery {
    pub async fn connect(endpoints: &[String], timeout: Duration) -> Result<Self, DiscoveryError> {
        let options = ConnectOptions::new()
            .with_connect_timeout(timeout)
            .with_timeout(timeout);
        let client = Client::connect(endpoints, Some(options)).await?;

        tracing::info!(?endpoints, "connected to etcd");

        Ok(Self {
            client,
            leases: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl ServiceDiscovery for EtcdDiscovery {
    async fn watch_service(
        &self,
        prefix: &str,
        handler: Arc<dyn WatchHandler>,
    ) -> Result<(), DiscoveryError> {
        let mut client = self.client.clone();

        let existing = client
            .get(prefix, Some(GetOptions::new().with_prefix()))
            .await?;
        for kv in existing.kvs() {
            handler.on_set(kv.key_str()?, kv.value_str()?);
        }

        // Resume right after the snapshot so nothing between get and watch is missed.
        let options = WatchOptions::new()
            .with_prefix()
            .with_prev_key()
            .with_start_revision(resume_revision(existing.header().map(|h| h.revision())));
        let (watcher, mut stream) = client.watch(prefix, Some(options)).await?;

        let prefix = prefix.to_string();
        tracing::info!(prefix, "etcd watch established");

        tokio::spawn(async move {
            // Dropping the watcher cancels the watch.
            let _watcher = watcher;

            loop {
                let response = match stream.message().await {
                    Ok(Some(response)) => response,
                    Ok(None) => {
                        handler.on_watch_lost(&prefix, "etcd watch stream closed");
                        return;
                    }
                    Err(e) => {
                        handler.on_watch_lost(&prefix, &format!("etcd watch stream failed: {e}"));
                        return;
                    }
                };

                if response.canceled() {
                    let reason = format!("etcd canceled the watch: {}", response.cancel_reason());
                    handler.on_watch_lost(&prefix, &reason);
                    return;
                }

                for event in response.events() {
                    match event.event_type() {
                        EventType::Put => {
                            if let Some(kv) = event.kv() {
                                match (kv.key_str(), kv.value_str()) {
                                    (Ok(key), Ok(value)) => handler.on_set(key, value),
                                    _ => tracing::warn!(prefix, "non-utf8 key or value skipped"),
                                }
                            }
                        }
                        EventType::Delete => {
                            let Some(key) = event.kv().and_then(|kv| kv.key_str().ok()) else {
                                continue;
                            };
                            let previous = event
                                .prev_kv()
                                .and_then(|kv| kv.value_str().ok())
                                .unwrap_or_default();
                            handler.on_delete(key, previous);
                        }
                    }
                }
            }
        });

        Ok(())
    }

    async fn register_service(
        &self,
        key: &str,
        info: &EndpointInfo,
        lease_ttl: Duration,
    ) -> Result<(), DiscoveryError> {
        let value = info.to_json().map_err(|source| DiscoveryError::Encode {
            key: key.to_string(),
            source,
        })?;

        let mut client = self.client.clone();

        // Re-registration refreshes the value under the lease that is already kept alive.
        let existing = self
            .leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied();
        if let Some(lease_id) = existing {
            client
                .put(key, value, Some(PutOptions::new().with_lease(lease_id)))
                .await?;
            return Ok(());
        }

        let lease = client
            .lease_grant(lease_ttl.as_secs().max(1) as i64, None)
            .await?;
        let lease_id = lease.id();

        client
            .put(key, value, Some(PutOptions::new().with_lease(lease_id)))
            .await?;

        let (mut keeper, mut responses) = client.lease_keep_alive(lease_id).await?;
        let refresh = (lease_ttl / 3).max(Duration::from_millis(500));
        let lease_key = key.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresh);
            loop {
                ticker.tick().await;

                if let Err(e) = keeper.keep_alive().await {
                    tracing::warn!(key = %lease_key, error = %e, "lease keep-alive failed");
                    return;
                }

                match responses.message().await {
                    Ok(Some(resp)) => {
                        tracing::trace!(key = %lease_key, ttl = resp.ttl(), "lease renewed")
                    }
                    Ok(None) => return,
                    Err(e) => {
                        tracing::warn!(
                            key = %lease_key,
                            error = %e,
                            "lease keep-alive stream failed"
                        );
                        return;
                    }
                }
            }
        });

        self.leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), lease_id);

        tracing::info!(key, lease_id, "service registered");
        Ok(())
    }

    async fn deregister_service(&self, key: &str) -> Result<(), DiscoveryError> {
        let lease_id = self
            .leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        let mut client = self.client.clone();
        match lease_id {
            Some(id) => {
                client.lease_revoke(id).await?;
            }
            None => {
                client.delete(key, None).await?;
            }
        }

        tracing::info!(key, "service deregistered");
        Ok(())
    }
}

/// First revision a watch must cover after a snapshot read at `snapshot_revision`.
///
/// Without a header the watch starts at the current revision.
pub(crate) fn resume_revision(snapshot_revision: Option<i64>) -> i64 {
    snapshot_revision.map_or(0, |revision| revision + 1)
}
