use crate::discovery::{DiscoveryError, EndpointInfo, ServiceDiscovery};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Synthetic gateways registered in debug mode: (node name, port).
pub const DEBUG_NODES: [(&str, &str); 3] = [("node1", "8080"), ("node2", "8081"), ("node3", "8082")];

const DEBUG_NODE_IP: &str = "127.0.0.1";
const DEBUG_LEASE_TTL: Duration = Duration::from_secs(5);

/// Register the synthetic nodes under `prefix` and keep reporting random load for them.
///
/// Lets the service run locally without a coordination cluster feeding it real gateways.
pub async fn register_debug_nodes(
    discovery: Arc<dyn ServiceDiscovery>,
    prefix: &str,
    refresh: Duration,
) -> Result<(), DiscoveryError> {
    for (node, port) in DEBUG_NODES {
        let key = node_key(prefix, node);
        discovery
            .register_service(&key, &random_load(port), DEBUG_LEASE_TTL)
            .await?;
        tracing::info!(key = %key, port, "debug node registered");
    }

    let prefix = prefix.to_string();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(refresh);
        // The first tick completes immediately; initial load is already registered.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            for (node, port) in DEBUG_NODES {
                let key = node_key(&prefix, node);
                if let Err(e) = discovery
                    .register_service(&key, &random_load(port), DEBUG_LEASE_TTL)
                    .await
                {
                    tracing::warn!(key = %key, error = %e, "debug node load refresh failed");
                }
            }
        }
    });

    Ok(())
}

fn node_key(prefix: &str, node: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), node)
}

fn random_load(port: &str) -> EndpointInfo {
    let mut rng = rand::rng();
    let spare_connections = rng.random_range(0..10_000) as f64;
    let spare_bandwidth_bytes = rng.random_range(0..(8u64 << 30)) as f64;

    EndpointInfo::new(DEBUG_NODE_IP, port).with_load(spare_connections, spare_bandwidth_bytes)
}
