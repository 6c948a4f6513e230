use crate::conf::error::ConfigError;
use crate::conf::types::RuntimeConfig;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Read, parse and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config = parse_config(&contents).map_err(|e| ConfigError::parse(path, e))?;

    validate_config(&config)?;

    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<RuntimeConfig, hcl::Error> {
    hcl::from_str(contents)
}

/// Semantic checks that serde cannot express. Reports the first problem found.
pub fn validate_config(config: &RuntimeConfig) -> Result<(), ConfigError> {
    config
        .server
        .listen
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidListen {
            listen: config.server.listen.clone(),
            reason: e.to_string(),
        })?;

    if config.server.threads == Some(0) {
        return Err(ConfigError::InvalidThreads);
    }

    if config.discovery.endpoints.iter().all(|e| e.trim().is_empty()) {
        return Err(ConfigError::NoDiscoveryEndpoints);
    }

    if config.discovery.timeout_secs == 0 {
        return Err(ConfigError::InvalidDiscoveryTimeout);
    }

    let ip_conf = &config.ip_conf;

    if ip_conf.service_path.trim().is_empty() {
        return Err(ConfigError::EmptyServicePath);
    }

    if ip_conf.max_results == Some(0) {
        return Err(ConfigError::InvalidMaxResults);
    }

    if ip_conf.stat_queue_capacity == 0 {
        return Err(ConfigError::InvalidStatQueueCapacity);
    }

    if ip_conf.debug_refresh_secs == 0 {
        return Err(ConfigError::InvalidDebugRefresh);
    }

    Ok(())
}
