use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata key carrying spare connection slots.
pub const META_CONNECT_NUM: &str = "connect_num";

/// Metadata key carrying spare bandwidth in bytes.
pub const META_MESSAGE_BYTES: &str = "message_bytes";

/// Value a gateway publishes under the watched prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub ip: String,
    pub port: String,
    /// Gateways registered without metadata publish `"meta": null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meta: BTreeMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BTreeMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl EndpointInfo {
    pub fn new(ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: port.into(),
            meta: BTreeMap::new(),
        }
    }

    /// Attach the load metadata the dispatcher ranks on.
    pub fn with_load(mut self, spare_connections: f64, spare_bandwidth_bytes: f64) -> Self {
        self.meta
            .insert(META_CONNECT_NUM.to_string(), spare_connections.into());
        self.meta
            .insert(META_MESSAGE_BYTES.to_string(), spare_bandwidth_bytes.into());
        self
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
