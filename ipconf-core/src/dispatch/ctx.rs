use std::net::{IpAddr, Ipv4Addr};

/// Client-identifying data carried into a dispatch.
///
/// Ranking does not personalize on it yet; it is part of the contract so that policies such
/// as region affinity can be added without touching callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCtx {
    /// Remote IP of the requesting client.
    pub ip: IpAddr,
}

impl Default for ClientCtx {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::UNSPECIFIED.into(),
        }
    }
}

/// Per-request context handed to the ranking algorithm.
#[derive(Debug, Clone, Default)]
pub struct DispatchCtx {
    pub client: ClientCtx,
}

impl DispatchCtx {
    pub fn new(client_ip: IpAddr) -> Self {
        Self {
            client: ClientCtx { ip: client_ip },
        }
    }
}
