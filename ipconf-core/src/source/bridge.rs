use crate::discovery::{DiscoveryError, EndpointInfo, ServiceDiscovery, WatchHandler};
use crate::source::{Event, EventKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};

/// Turns watch notifications into registry events on a single ordered channel.
///
/// Bad payloads are logged and dropped here so they never reach the registry. The identity
/// behind each watched key is remembered, so a delete that arrives without its last value
/// still removes the right endpoint.
#[derive(Debug)]
pub struct EventBridge {
    tx: mpsc::UnboundedSender<Event>,
    identities: Mutex<HashMap<String, (String, String)>>,
    lost: watch::Sender<Option<String>>,
}

impl EventBridge {
    /// Create a bridge and the receiving end the registry consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (lost, _) = watch::channel(None);
        let bridge = Self {
            tx,
            identities: Mutex::new(HashMap::new()),
            lost,
        };
        (bridge, rx)
    }

    /// Subscribe this bridge to `prefix` on `discovery`.
    pub async fn watch(
        self: Arc<Self>,
        discovery: &dyn ServiceDiscovery,
        prefix: &str,
    ) -> Result<(), DiscoveryError> {
        discovery.watch_service(prefix, self).await
    }

    /// Observe the watch ending. Holds `Some(reason)` once the backend has given up.
    pub fn watch_lost(&self) -> watch::Receiver<Option<String>> {
        self.lost.subscribe()
    }

    fn forward_set(&self, key: &str, value: &str) {
        let event = match Event::from_payload(EventKind::Add, value) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(key, kind = ?EventKind::Add, error = %e, "discovery event dropped");
                return;
            }
        };

        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (event.ip.clone(), event.port.clone()));

        self.send(key, event);
    }

    fn forward_delete(&self, key: &str, value: &str) {
        let remembered = self
            .identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        let event = match (Event::from_payload(EventKind::Delete, value), remembered) {
            (Ok(event), _) => event,
            (Err(_), Some((ip, port))) => match Event::delete(&EndpointInfo::new(ip, port)) {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(key, error = %e, "discovery delete dropped");
                    return;
                }
            },
            (Err(e), None) => {
                tracing::error!(
                    key,
                    kind = ?EventKind::Delete,
                    error = %e,
                    "discovery event dropped"
                );
                return;
            }
        };

        self.send(key, event);
    }

    fn send(&self, key: &str, event: Event) {
        let kind = event.kind;
        if self.tx.send(event).is_err() {
            tracing::warn!(key, ?kind, "registry event loop gone; event dropped");
        }
    }
}

impl WatchHandler for EventBridge {
    fn on_set(&self, key: &str, value: &str) {
        self.forward_set(key, value);
    }

    fn on_delete(&self, key: &str, value: &str) {
        self.forward_delete(key, value);
    }

    fn on_watch_lost(&self, prefix: &str, reason: &str) {
        tracing::error!(prefix, reason, "discovery watch lost");
        self.lost.send_replace(Some(format!("watch on '{prefix}' lost: {reason}")));
    }
}
