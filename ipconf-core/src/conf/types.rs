use crate::dispatch::DEFAULT_STAT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Represents the whole configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    pub ip_conf: IpConfConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// e.g. "0.0.0.0:6789"
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Optional number of worker threads - default is decided by Pingora.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Deployment environment. "debug" registers synthetic gateway nodes.
    #[serde(default = "default_env")]
    pub env: String,
}

impl GlobalConfig {
    pub fn is_debug(&self) -> bool {
        self.env == "debug"
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { env: default_env() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Coordination cluster members, e.g. "localhost:2379".
    #[serde(default = "default_discovery_endpoints")]
    pub endpoints: Vec<String>,

    /// Connect timeout in seconds.
    #[serde(default = "default_discovery_timeout_secs")]
    pub timeout_secs: u64,
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoints: default_discovery_endpoints(),
            timeout_secs: default_discovery_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IpConfConfig {
    /// Key prefix gateways register under.
    pub service_path: String,

    /// Truncate `/ip/list` to this many entries. Unset returns every candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,

    /// Pending samples buffered per endpoint before producers wait.
    #[serde(default = "default_stat_queue_capacity")]
    pub stat_queue_capacity: usize,

    /// How often debug nodes report fresh load, in seconds.
    #[serde(default = "default_debug_refresh_secs")]
    pub debug_refresh_secs: u64,
}

impl IpConfConfig {
    pub fn debug_refresh(&self) -> Duration {
        Duration::from_secs(self.debug_refresh_secs)
    }
}

fn default_listen() -> String {
    "0.0.0.0:6789".to_string()
}

fn default_env() -> String {
    "production".to_string()
}

fn default_discovery_endpoints() -> Vec<String> {
    vec!["localhost:2379".to_string()]
}

fn default_discovery_timeout_secs() -> u64 {
    5
}

fn default_stat_queue_capacity() -> usize {
    DEFAULT_STAT_QUEUE_CAPACITY
}

fn default_debug_refresh_secs() -> u64 {
    1
}
