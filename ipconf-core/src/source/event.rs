use crate::discovery::{EndpointInfo, META_CONNECT_NUM, META_MESSAGE_BYTES};
use crate::dispatch::{EndpointKey, Stat};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Endpoint joined or reported fresh load.
    Add,
    /// Endpoint left.
    Delete,
}

/// Membership or load change, ready for the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub ip: String,
    pub port: String,
    pub spare_connections: f64,
    pub spare_bandwidth_bytes: f64,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed discovery payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("discovery payload has no {field}")]
    MissingIdentity { field: &'static str },

    #[error("endpoint {endpoint} is missing metadata field '{field}'")]
    MissingMetadata {
        endpoint: EndpointKey,
        field: &'static str,
    },

    #[error("endpoint {endpoint} has non-numeric metadata field '{field}': {value}")]
    NonNumericMetadata {
        endpoint: EndpointKey,
        field: &'static str,
        value: String,
    },
}

impl Event {
    /// Build an Add event. Both load fields must be present and numeric.
    pub fn add(info: &EndpointInfo) -> Result<Self, EventError> {
        check_identity(info)?;
        let endpoint = EndpointKey::new(&info.ip, &info.port);

        Ok(Self {
            kind: EventKind::Add,
            ip: info.ip.clone(),
            port: info.port.clone(),
            spare_connections: numeric_meta(info, &endpoint, META_CONNECT_NUM)?,
            spare_bandwidth_bytes: numeric_meta(info, &endpoint, META_MESSAGE_BYTES)?,
        })
    }

    /// Build a Delete event. Only the identity is needed.
    pub fn delete(info: &EndpointInfo) -> Result<Self, EventError> {
        check_identity(info)?;

        Ok(Self {
            kind: EventKind::Delete,
            ip: info.ip.clone(),
            port: info.port.clone(),
            spare_connections: 0.0,
            spare_bandwidth_bytes: 0.0,
        })
    }

    /// Decode a raw watch value into an event of the given kind.
    pub fn from_payload(kind: EventKind, payload: &str) -> Result<Self, EventError> {
        let info = EndpointInfo::from_json(payload)?;
        match kind {
            EventKind::Add => Self::add(&info),
            EventKind::Delete => Self::delete(&info),
        }
    }

    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.ip, &self.port)
    }

    pub fn stat(&self) -> Stat {
        Stat::new(self.spare_connections, self.spare_bandwidth_bytes)
    }
}

fn check_identity(info: &EndpointInfo) -> Result<(), EventError> {
    if info.ip.is_empty() {
        return Err(EventError::MissingIdentity { field: "ip" });
    }
    if info.port.is_empty() {
        return Err(EventError::MissingIdentity { field: "port" });
    }
    Ok(())
}

fn numeric_meta(
    info: &EndpointInfo,
    endpoint: &EndpointKey,
    field: &'static str,
) -> Result<f64, EventError> {
    let value = info
        .meta
        .get(field)
        .ok_or_else(|| EventError::MissingMetadata {
            endpoint: endpoint.clone(),
            field,
        })?;

    value.as_f64().ok_or_else(|| EventError::NonNumericMetadata {
        endpoint: endpoint.clone(),
        field,
        value: value.to_string(),
    })
}
