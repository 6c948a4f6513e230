use crate::discovery::{EndpointInfo, MemoryDiscovery, ServiceDiscovery};
use crate::source::{DEBUG_NODES, Event, register_debug_nodes};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn debug_nodes_are_registered_under_prefix() {
    // Arrange
    let discovery = Arc::new(MemoryDiscovery::new());
    let shared: Arc<dyn ServiceDiscovery> = discovery.clone();

    // Act
    register_debug_nodes(shared, "/platos/ip_dispatch/", Duration::from_secs(3600))
        .await
        .expect("registration");

    // Assert
    let registered = discovery.get_prefix("/platos/ip_dispatch/");
    assert_eq!(registered.len(), DEBUG_NODES.len());

    for ((key, value), (node, port)) in registered.iter().zip(DEBUG_NODES) {
        assert_eq!(key, &format!("/platos/ip_dispatch/{node}"));

        let info = EndpointInfo::from_json(value).expect("valid payload");
        assert_eq!(info.port, port);

        // Every synthetic node must produce a usable Add event.
        Event::add(&info).expect("debug node carries load metadata");
    }
}
