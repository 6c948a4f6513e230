use crate::harness::{CapturedEvent, init_test_tracing};
use ipconf_core::conf::{RuntimeConfig, parse_config, validate_config};
use ipconf_core::discovery::{EndpointInfo, MemoryDiscovery, ServiceDiscovery};
use ipconf_core::dispatch::{CandidateRegistry, EndpointKey, Stat};
use ipconf_core::server::{ControlPlane, build_pingora_server, start_control_plane};
use reqwest::blocking::{Client, RequestBuilder};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Prefix every test server watches.
pub const SERVICE_PATH: &str = "/platos/ip_dispatch";

/// Handle to a running ipconf test server backed by an in-process discovery store.
pub struct TestServer {
    base_url: String,
    client: Client,
    discovery: Arc<MemoryDiscovery>,
    control_plane: ControlPlane,
    // Owns the registry loop and endpoint workers; dropped last.
    _control_rt: Runtime,
}

impl TestServer {
    /// Start a server with default dispatch settings.
    pub fn start() -> Self {
        Self::start_with(None)
    }

    /// Start a server, optionally limiting `/ip/list` to the top `max_results` entries.
    ///
    /// Ports are allocated dynamically, so servers can run in parallel.
    pub fn start_with(max_results: Option<usize>) -> Self {
        // Initialize tracing (this must happen first).
        let events = events();
        init_test_tracing(events.clone());

        let listen_port = free_port();
        let cfg = render_config(listen_port, max_results);
        validate_config(&cfg).expect("test config must be valid");

        let control_rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ipconf-test-control")
            .enable_all()
            .build()
            .expect("failed to build control runtime");

        let discovery = Arc::new(MemoryDiscovery::new());
        let shared: Arc<dyn ServiceDiscovery> = discovery.clone();
        let registry = Arc::new(CandidateRegistry::new(cfg.ip_conf.stat_queue_capacity));

        let control_plane = control_rt
            .block_on(start_control_plane(&cfg, registry.clone(), shared))
            .expect("failed to start control plane");

        let server = build_pingora_server(&cfg, registry).expect("failed to build ipconf server");

        thread::spawn(move || {
            server.run_forever();
        });

        let base_url = format!("http://127.0.0.1:{listen_port}");
        wait_for_server(&base_url);

        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .expect("failed to build client");

        Self {
            base_url,
            client,
            discovery,
            control_plane,
            _control_rt: control_rt,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}{}", self.base_url, path))
    }

    /// Publish a gateway under the watched prefix and wait until its load is visible to
    /// dispatch.
    pub fn put_gateway(&self, name: &str, ip: &str, port: &str, connections: f64, bytes: f64) {
        let info = EndpointInfo::new(ip, port).with_load(connections, bytes);
        let value = info.to_json().expect("gateway payload encodes");
        self.discovery.put(&gateway_key(name), &value);

        let key = EndpointKey::new(ip, port);
        let registry = self.control_plane.registry.clone();
        wait_until(&format!("{key} to publish a load sample"), || {
            registry
                .get(&key)
                .and_then(|endpoint| endpoint.published_stat())
                .is_some_and(|stat| *stat != Stat::default())
        });
    }

    /// Publish a raw payload under the watched prefix without waiting.
    pub fn put_raw(&self, name: &str, value: &str) {
        self.discovery.put(&gateway_key(name), value);
    }

    /// Remove a gateway and wait until the registry has dropped it.
    pub fn delete_gateway(&self, name: &str, ip: &str, port: &str) {
        assert!(
            self.discovery.delete(&gateway_key(name)),
            "gateway {name} was never published"
        );

        let key = EndpointKey::new(ip, port);
        let registry = self.control_plane.registry.clone();
        wait_until(&format!("{key} to be removed"), || registry.get(&key).is_none());
    }

    pub fn candidate_count(&self) -> usize {
        self.control_plane.registry.len()
    }
}

fn gateway_key(name: &str) -> String {
    format!("{SERVICE_PATH}/{name}")
}

fn render_config(listen_port: u16, max_results: Option<usize>) -> RuntimeConfig {
    let limit = max_results
        .map(|n| format!("  max_results = {n}\n"))
        .unwrap_or_default();

    let hcl = format!(
        r#"
server {{
  listen  = "127.0.0.1:{listen_port}"
  threads = 1
}}

ip_conf {{
  service_path = "{SERVICE_PATH}"
{limit}}}
"#
    );

    parse_config(&hcl).expect("failed to parse test config")
}

/// Poll until `cond` holds (or panic).
pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);

    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Poll until the server accepts connections (or panic).
fn wait_for_server(listen_addr: &str) {
    let addr = listen_addr.strip_prefix("http://").unwrap_or(listen_addr);
    wait_until(&format!("server at {listen_addr}"), || {
        TcpStream::connect(addr).is_ok()
    });
}

static EVENTS: OnceLock<Arc<Mutex<Vec<CapturedEvent>>>> = OnceLock::new();

/// Events captured from every server in this test binary.
pub fn events() -> Arc<Mutex<Vec<CapturedEvent>>> {
    EVENTS
        .get_or_init(|| Arc::new(Mutex::new(Vec::new())))
        .clone()
}

/// Allocate a free port on localhost.
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
