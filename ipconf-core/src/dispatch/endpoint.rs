use crate::dispatch::{DispatchCtx, Stat, StatWindow};
use arc_swap::{ArcSwap, ArcSwapOption};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default depth of an endpoint's pending-sample queue.
pub const DEFAULT_STAT_QUEUE_CAPACITY: usize = 16;

/// Identity of a gateway endpoint, formatted `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey(pub String);

impl EndpointKey {
    pub fn new(ip: &str, port: &str) -> Self {
        Self(format!("{ip}:{port}"))
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scores {
    /// Derived from spare bandwidth; primary sort key.
    pub active_score: f64,

    /// Derived from spare connections; tie-breaker.
    pub static_score: f64,
}

impl Scores {
    fn from_stat(stat: &Stat) -> Self {
        Self {
            active_score: stat.active_score(),
            static_score: stat.static_score(),
        }
    }
}

/// One candidate gateway node.
///
/// Raw samples are handed to a private worker task which owns the sliding window and
/// publishes each new average as a fresh `Arc<Stat>`. Readers only ever load that pointer.
/// Dropping the endpoint closes the queue and the worker exits.
#[derive(Debug)]
pub struct Endpoint {
    key: EndpointKey,
    ip: String,
    port: String,
    published: Arc<ArcSwapOption<Stat>>,
    scores: ArcSwap<Scores>,
    updates: mpsc::Sender<Stat>,
}

impl Endpoint {
    /// Create an endpoint and start its update loop on the current tokio runtime.
    pub fn spawn(ip: impl Into<String>, port: impl Into<String>, queue_capacity: usize) -> Self {
        let ip = ip.into();
        let port = port.into();
        let key = EndpointKey::new(&ip, &port);

        let window = StatWindow::new();
        let published = Arc::new(ArcSwapOption::from_pointee(window.snapshot()));
        let (updates, rx) = mpsc::channel(queue_capacity.max(1));

        tokio::spawn(run_stat_worker(key.clone(), window, rx, published.clone()));

        Self {
            key,
            ip,
            port,
            published,
            scores: ArcSwap::from_pointee(Scores::default()),
            updates,
        }
    }

    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Hand a raw sample to the update loop.
    ///
    /// Waits only while the queue is full. A closed queue means the worker is gone, which
    /// only happens during teardown, so the sample is dropped.
    pub async fn update_stat(&self, sample: Stat) {
        if self.updates.send(sample).await.is_err() {
            tracing::debug!(endpoint = %self.key, "stat worker closed; sample dropped");
        }
    }

    /// Recompute scores from the latest published average.
    ///
    /// With nothing published the previous scores are kept; a gap in stats must not zero out
    /// a candidate.
    pub fn calculate_score(&self, _ctx: &DispatchCtx) -> Scores {
        match self.published.load_full() {
            Some(stat) => {
                let scores = Scores::from_stat(&stat);
                self.scores.store(Arc::new(scores));
                scores
            }
            None => **self.scores.load(),
        }
    }

    /// Scores from the most recent `calculate_score`.
    pub fn scores(&self) -> Scores {
        **self.scores.load()
    }

    /// Most recently published window average.
    pub fn published_stat(&self) -> Option<Arc<Stat>> {
        self.published.load_full()
    }

    #[cfg(test)]
    pub(crate) fn clear_published(&self) {
        self.published.store(None);
    }
}

async fn run_stat_worker(
    key: EndpointKey,
    mut window: StatWindow,
    mut rx: mpsc::Receiver<Stat>,
    published: Arc<ArcSwapOption<Stat>>,
) {
    while let Some(sample) = rx.recv().await {
        window.append(sample);
        published.store(Some(Arc::new(window.snapshot())));

        tracing::trace!(
            endpoint = %key,
            samples = window.appended(),
            "published window average"
        );
    }

    tracing::debug!(endpoint = %key, "stat worker stopped");
}
