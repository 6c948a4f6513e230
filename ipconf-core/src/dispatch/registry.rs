use crate::dispatch::{DEFAULT_STAT_QUEUE_CAPACITY, Endpoint, EndpointKey};
use crate::source::{Event, EventKind};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Authoritative table of live candidate endpoints.
///
/// Mutated only by the single event loop started with [`CandidateRegistry::start`]; read
/// concurrently by dispatch. Lock sections cover map operations only.
#[derive(Debug)]
pub struct CandidateRegistry {
    table: RwLock<HashMap<EndpointKey, Arc<Endpoint>>>,
    stat_queue_capacity: usize,
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_STAT_QUEUE_CAPACITY)
    }
}

impl CandidateRegistry {
    pub fn new(stat_queue_capacity: usize) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            stat_queue_capacity,
        }
    }

    /// Launch the event loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>, events: mpsc::UnboundedReceiver<Event>) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move { registry.run(events).await })
    }

    /// Apply events in arrival order until the channel closes.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<Event>) {
        tracing::info!("candidate registry event loop started");

        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        tracing::info!("candidate registry event loop stopped");
    }

    pub async fn handle_event(&self, event: Event) {
        match event.kind {
            EventKind::Add => self.handle_add(&event).await,
            EventKind::Delete => self.handle_delete(&event),
        }
    }

    /// Register a new endpoint or feed a load update to an existing one.
    pub async fn handle_add(&self, event: &Event) {
        let key = event.key();

        let endpoint = {
            let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(key.clone())
                .or_insert_with(|| {
                    tracing::info!(endpoint = %key, "candidate added");
                    Arc::new(Endpoint::spawn(
                        event.ip.clone(),
                        event.port.clone(),
                        self.stat_queue_capacity,
                    ))
                })
                .clone()
        };

        // Handoff happens outside the lock; a slow endpoint must not stall readers.
        endpoint.update_stat(event.stat()).await;
    }

    /// Remove an endpoint. Unknown identities are ignored.
    pub fn handle_delete(&self, event: &Event) {
        let key = event.key();

        let removed = self
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);

        match removed {
            Some(_) => tracing::info!(endpoint = %key, "candidate removed"),
            None => tracing::debug!(endpoint = %key, "delete for unknown candidate ignored"),
        }
    }

    /// Point-in-time membership. Later table changes do not affect the returned list.
    pub fn snapshot(&self) -> Vec<Arc<Endpoint>> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, key: &EndpointKey) -> Option<Arc<Endpoint>> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
