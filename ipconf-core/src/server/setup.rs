use crate::conf::RuntimeConfig;
use crate::discovery::{ServiceDiscovery, connect_discovery};
use crate::dispatch::{CandidateRegistry, EndpointDirector};
use crate::server::gateway::IpConfGateway;
use crate::source::{EventBridge, register_debug_nodes};
use anyhow::{Context, Error, Result};
use pingora::prelude::*;
use pingora::server::Server;
use pingora::server::configuration::ServerConf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Live control-plane pieces. Keep it alive for as long as the server runs.
pub struct ControlPlane {
    pub registry: Arc<CandidateRegistry>,
    pub discovery: Arc<dyn ServiceDiscovery>,
    pub event_loop: JoinHandle<()>,
    watch_lost: watch::Receiver<Option<String>>,
}

impl ControlPlane {
    /// Resolve with the reason once the discovery watch has ended.
    pub async fn watch_lost(&mut self) -> String {
        match self.watch_lost.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone().unwrap_or_default(),
            Err(_) => "discovery watch dropped".to_string(),
        }
    }
}

/// Run the dispatch service with the given configuration.
pub fn run(config: RuntimeConfig) -> Result<()> {
    use tokio::runtime::Builder;

    // Control-plane runtime: discovery watch, registry loop, endpoint workers.
    let control_rt = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("ipconf-control")
        .enable_all()
        .build()
        .context("failed to build control-plane Tokio runtime")?;

    let registry = Arc::new(CandidateRegistry::new(config.ip_conf.stat_queue_capacity));

    // A watch that cannot be established is fatal; there is no retry.
    let mut control_plane = control_rt.block_on(async {
        let discovery = connect_discovery(&config)
            .await
            .context("failed to connect to discovery")?;
        start_control_plane(&config, registry.clone(), discovery).await
    })?;

    // The registry would stop changing without the watch; losing it is fatal.
    control_rt.spawn(async move {
        let reason = control_plane.watch_lost().await;
        tracing::error!(reason = %reason, "discovery watch lost; shutting down");
        std::process::exit(1);
    });

    // Build Pingora server (Pingora owns its own runtimes)
    let server = build_pingora_server(&config, registry)?;

    tracing::info!(listen = %config.server.listen, "ipconf listening");

    // control_rt must stay in scope; run_forever never returns.
    server.run_forever();
}

/// Wire the event bridge to the registry and establish the discovery watch.
///
/// Must be called from within a Tokio runtime; the registry loop and endpoint workers are
/// spawned onto it.
pub async fn start_control_plane(
    config: &RuntimeConfig,
    registry: Arc<CandidateRegistry>,
    discovery: Arc<dyn ServiceDiscovery>,
) -> Result<ControlPlane> {
    let prefix = config.ip_conf.service_path.as_str();

    let (bridge, events) = EventBridge::channel();
    let watch_lost = bridge.watch_lost();
    let event_loop = registry.start(events);

    if config.global.is_debug() {
        register_debug_nodes(discovery.clone(), prefix, config.ip_conf.debug_refresh())
            .await
            .context("failed to register debug nodes")?;
    }

    Arc::new(bridge)
        .watch(discovery.as_ref(), prefix)
        .await
        .with_context(|| format!("failed to watch discovery prefix '{prefix}'"))?;

    tracing::info!(prefix, debug = config.global.is_debug(), "control plane started");

    Ok(ControlPlane {
        registry,
        discovery,
        event_loop,
        watch_lost,
    })
}

/// Build the Pingora server.
pub fn build_pingora_server(
    config: &RuntimeConfig,
    registry: Arc<CandidateRegistry>,
) -> Result<Server, Error> {
    let mut server = if let Some(threads) = config.server.threads {
        tracing::debug!(
            threads,
            "Creating Pingora server with overridden worker threads"
        );
        let mut conf =
            ServerConf::new().context("could not construct pingora server configuration")?;
        conf.threads = threads;
        Server::new_with_opt_and_conf(None, conf)
    } else {
        // "None" is required here to truly tell Pingora to use its default settings.
        Server::new(None)?
    };

    server.bootstrap();

    let gateway = IpConfGateway::new(
        EndpointDirector::new(registry),
        config.ip_conf.max_results,
    );

    let mut svc = http_proxy_service(&server.configuration, gateway);
    svc.add_tcp(&config.server.listen);

    server.add_service(svc);

    Ok(server)
}
