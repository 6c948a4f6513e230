mod window;

use crate::source::{Event, EventKind};
use std::time::{Duration, Instant};

const GIB: f64 = (1u64 << 30) as f64;

/// Helper: Add event carrying the given load.
fn add_event(ip: &str, port: &str, connections: f64, bandwidth: f64) -> Event {
    Event {
        kind: EventKind::Add,
        ip: ip.to_string(),
        port: port.to_string(),
        spare_connections: connections,
        spare_bandwidth_bytes: bandwidth,
    }
}

/// Helper: Delete event for an identity.
fn delete_event(ip: &str, port: &str) -> Event {
    Event {
        kind: EventKind::Delete,
        ip: ip.to_string(),
        port: port.to_string(),
        spare_connections: 0.0,
        spare_bandwidth_bytes: 0.0,
    }
}

/// Helper: poll until `check` holds; endpoint workers publish asynchronously.
async fn eventually(check: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
