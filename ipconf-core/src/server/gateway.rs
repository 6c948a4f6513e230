use crate::dispatch::{DispatchCtx, EndpointDirector};
use crate::server::handler::{ApiResponse, IpListHandler};
use async_trait::async_trait;
use http::header;
use pingora::prelude::{HttpPeer, ProxyHttp, Session};
use pingora::protocols::l4::socket::SocketAddr as PingoraSocketAddr;
use pingora::{Custom, Error};
use pingora_http::ResponseHeader;
use std::net::{IpAddr, Ipv4Addr};

/// Terminal HTTP service answering dispatch queries. Never proxies.
pub struct IpConfGateway {
    handler: IpListHandler,
}

impl IpConfGateway {
    pub fn new(director: EndpointDirector, max_results: Option<usize>) -> Self {
        Self {
            handler: IpListHandler::new(director, max_results),
        }
    }
}

#[async_trait]
impl ProxyHttp for IpConfGateway {
    type CTX = DispatchCtx;

    fn new_ctx(&self) -> Self::CTX {
        DispatchCtx::default()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> pingora::Result<Box<HttpPeer>> {
        // request_filter always answers, so no request reaches this point.
        Err(Error::new(Custom("IpConfGateway attempted to proxy upstream (bug)")))
    }

    async fn request_filter(
        &self,
        session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> pingora::Result<bool> {
        *ctx = DispatchCtx::new(client_ip(session));

        let request = session.req_header();
        let response = self
            .handler
            .respond(&request.method, request.uri.path(), ctx);

        send_json_response(session, response).await?;
        Ok(true)
    }
}

fn client_ip(session: &Session) -> IpAddr {
    match session.client_addr() {
        Some(PingoraSocketAddr::Inet(addr)) => addr.ip(),
        _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    }
}

async fn send_json_response(session: &mut Session, response: ApiResponse) -> pingora::Result<()> {
    let mut resp = ResponseHeader::build(response.status, None)?;
    resp.insert_header(header::CONTENT_TYPE, "application/json")?;
    resp.insert_header(header::CONTENT_LENGTH, response.body.len().to_string())?;
    if let Some(allow) = response.allow {
        resp.insert_header(header::ALLOW, allow)?;
    }

    session.write_response_header(Box::new(resp), false).await?;
    session
        .write_response_body(Some(response.body.into()), true)
        .await?;

    Ok(())
}
