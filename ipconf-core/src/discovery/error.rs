use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to encode endpoint info for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no value registered under {key}")]
    NotRegistered { key: String },

    #[cfg(not(feature = "etcd"))]
    #[error(
        "cannot watch {endpoints:?}: built without the `etcd` feature \
         (rebuild with `--features etcd` or set global.env = \"debug\")"
    )]
    NoBackend { endpoints: Vec<String> },

    #[cfg(feature = "etcd")]
    #[error("etcd request failed: {0}")]
    Etcd(#[from] etcd_client::Error),
}
