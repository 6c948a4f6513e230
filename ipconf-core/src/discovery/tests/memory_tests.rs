use super::Recorder;
use crate::discovery::{MemoryDiscovery, ServiceDiscovery};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn watch_replays_then_streams_with_previous_values() {
    // Arrange
    let discovery = MemoryDiscovery::new();
    discovery.put("/gw/a", "1");
    let recorder = Arc::new(Recorder::default());

    // Act
    discovery
        .watch_service("/gw/", recorder.clone())
        .await
        .expect("watch");
    discovery.put("/gw/b", "2");
    discovery.put("/other", "3");
    discovery.delete("/gw/a");

    // Assert
    assert_eq!(
        recorder.lines(),
        vec!["set /gw/a=1", "set /gw/b=2", "delete /gw/a=1"]
    );
}

#[tokio::test]
async fn closed_watches_report_the_reason_and_go_quiet() {
    // Arrange
    let discovery = MemoryDiscovery::new();
    let recorder = Arc::new(Recorder::default());
    discovery
        .watch_service("/gw/", recorder.clone())
        .await
        .expect("watch");

    // Act
    discovery.close_watches("cluster unreachable");
    discovery.put("/gw/late", "1");

    // Assert
    assert_eq!(recorder.lines(), vec!["lost /gw/: cluster unreachable"]);
}

#[tokio::test]
async fn deregister_unknown_key_is_an_error() {
    let discovery = MemoryDiscovery::new();

    let result = discovery.deregister_service("/gw/missing").await;

    assert!(result.is_err());
}
