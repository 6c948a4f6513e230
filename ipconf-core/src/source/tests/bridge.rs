use crate::discovery::{EndpointInfo, MemoryDiscovery, WatchHandler};
use crate::source::{EventBridge, EventKind};
use std::sync::Arc;

fn payload(ip: &str, port: &str, connections: f64, bandwidth: f64) -> String {
    EndpointInfo::new(ip, port)
        .with_load(connections, bandwidth)
        .to_json()
        .unwrap()
}

#[test]
fn set_and_delete_become_typed_events() {
    // Arrange
    let (bridge, mut events) = EventBridge::channel();
    let value = payload("10.0.0.1", "8080", 7.0, 9.0);

    // Act
    bridge.on_set("/gw/node1", &value);
    bridge.on_delete("/gw/node1", &value);

    // Assert
    let added = events.try_recv().expect("add event");
    assert_eq!(added.kind, EventKind::Add);
    assert_eq!(added.spare_connections, 7.0);
    assert_eq!(added.spare_bandwidth_bytes, 9.0);

    let deleted = events.try_recv().expect("delete event");
    assert_eq!(deleted.kind, EventKind::Delete);
    assert_eq!(deleted.key(), added.key());

    assert!(events.try_recv().is_err());
}

#[test]
fn bad_payloads_never_reach_the_channel() {
    let (bridge, mut events) = EventBridge::channel();

    bridge.on_set("/gw/broken", "{oops");
    bridge.on_set("/gw/no-meta", r#"{"ip":"10.0.0.1","port":"8080"}"#);
    bridge.on_set("/gw/ok", &payload("10.0.0.2", "8080", 1.0, 1.0));

    let only = events.try_recv().expect("valid event forwarded");
    assert_eq!(only.ip, "10.0.0.2");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn watch_replays_existing_keys_then_streams_changes() {
    // Arrange
    let discovery = MemoryDiscovery::new();
    discovery.put("/gw/node1", &payload("10.0.0.1", "8080", 1.0, 1.0));
    discovery.put("/other/node", &payload("10.9.9.9", "1", 1.0, 1.0));
    let (bridge, mut events) = EventBridge::channel();

    // Act
    Arc::new(bridge)
        .watch(&discovery, "/gw/")
        .await
        .expect("watch established");
    discovery.put("/gw/node2", &payload("10.0.0.2", "8080", 1.0, 1.0));
    discovery.delete("/gw/node1");
    discovery.put("/other/node2", &payload("10.9.9.8", "1", 1.0, 1.0));

    // Assert: replay, then live changes in order, nothing outside the prefix
    let seen: Vec<(EventKind, String)> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| (e.kind, e.key().to_string()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (EventKind::Add, "10.0.0.1:8080".to_string()),
            (EventKind::Add, "10.0.0.2:8080".to_string()),
            (EventKind::Delete, "10.0.0.1:8080".to_string()),
        ]
    );
}

#[test]
fn closed_registry_channel_does_not_panic() {
    let (bridge, events) = EventBridge::channel();
    drop(events);

    bridge.on_set("/gw/node1", &payload("10.0.0.1", "8080", 1.0, 1.0));
}

#[test]
fn delete_without_previous_value_uses_remembered_identity() {
    // Arrange
    let (bridge, mut events) = EventBridge::channel();
    bridge.on_set("/gw/node1", &payload("10.0.0.1", "8080", 1.0, 1.0));
    let added = events.try_recv().expect("add event");

    // Act: backend lost the previous value (e.g. after compaction)
    bridge.on_delete("/gw/node1", "");

    // Assert
    let deleted = events.try_recv().expect("delete event");
    assert_eq!(deleted.kind, EventKind::Delete);
    assert_eq!(deleted.key(), added.key());
}

#[test]
fn delete_with_null_meta_is_forwarded() {
    let (bridge, mut events) = EventBridge::channel();

    bridge.on_delete("/gw/bare", r#"{"ip":"10.0.0.3","port":"8080","meta":null}"#);

    let deleted = events.try_recv().expect("delete event");
    assert_eq!(deleted.key().to_string(), "10.0.0.3:8080");
}

#[test]
fn delete_of_unknown_key_without_value_is_dropped() {
    let (bridge, mut events) = EventBridge::channel();

    bridge.on_delete("/gw/never-seen", "");

    assert!(events.try_recv().is_err());
}

#[test]
fn remembered_identity_is_forgotten_after_delete() {
    let (bridge, mut events) = EventBridge::channel();
    let value = payload("10.0.0.1", "8080", 1.0, 1.0);
    bridge.on_set("/gw/node1", &value);
    bridge.on_delete("/gw/node1", &value);
    let _ = std::iter::from_fn(|| events.try_recv().ok()).count();

    bridge.on_delete("/gw/node1", "");

    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn lost_watch_is_signalled() {
    // Arrange
    let discovery = MemoryDiscovery::new();
    let (bridge, _events) = EventBridge::channel();
    let mut lost = bridge.watch_lost();
    Arc::new(bridge)
        .watch(&discovery, "/gw/")
        .await
        .expect("watch established");
    assert_eq!(*lost.borrow(), None);

    // Act
    discovery.close_watches("stream closed");

    // Assert
    lost.changed().await.expect("reason published");
    let reason = lost.borrow().clone().expect("reason recorded");
    assert!(reason.contains("/gw/"), "{reason}");
    assert!(reason.contains("stream closed"), "{reason}");
}
