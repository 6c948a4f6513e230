use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    //-------------------------------------------------------------------------
    // IO / Parsing
    //-------------------------------------------------------------------------
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {path}\n\n{source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },

    //-------------------------------------------------------------------------
    // Server
    //-------------------------------------------------------------------------
    #[error("invalid listen address '{listen}': {reason}")]
    InvalidListen { listen: String, reason: String },

    #[error("server threads must be greater than zero")]
    InvalidThreads,

    //-------------------------------------------------------------------------
    // Discovery
    //-------------------------------------------------------------------------
    #[error("discovery must list at least one endpoint")]
    NoDiscoveryEndpoints,

    #[error("discovery timeout must be greater than zero")]
    InvalidDiscoveryTimeout,

    //-------------------------------------------------------------------------
    // ip_conf
    //-------------------------------------------------------------------------
    #[error("ip_conf.service_path must not be empty")]
    EmptyServicePath,

    #[error("ip_conf.max_results must be greater than zero when set")]
    InvalidMaxResults,

    #[error("ip_conf.stat_queue_capacity must be greater than zero")]
    InvalidStatQueueCapacity,

    #[error("ip_conf.debug_refresh_secs must be greater than zero")]
    InvalidDebugRefresh,
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: hcl::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
