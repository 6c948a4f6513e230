use crate::dispatch::{DispatchCtx, EndpointDirector, RankedEndpoint, truncate_top};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;

#[derive(Debug, PartialEq)]
enum ApiEndpoint {
    IpList,
}

impl FromStr for ApiEndpoint {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "/ip/list" => Ok(ApiEndpoint::IpList),
            _ => Err("not found"),
        }
    }
}

/// Body of a successful `/ip/list` response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IpListResponse {
    pub message: String,
    pub code: i32,
    pub data: Vec<EndpointView>,
}

/// Wire form of one ranked endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointView {
    pub ip: String,
    pub port: String,
}

impl From<&RankedEndpoint> for EndpointView {
    fn from(ranked: &RankedEndpoint) -> Self {
        Self {
            ip: ranked.endpoint.ip().to_string(),
            port: ranked.endpoint.port().to_string(),
        }
    }
}

/// A fully rendered response, independent of the transport.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Value for the `Allow` header on 405 responses.
    pub allow: Option<&'static str>,
}

impl ApiResponse {
    fn json(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            allow: None,
        }
    }

    fn error(status: StatusCode, err: &str) -> Self {
        let body = serde_json::json!({ "err": err }).to_string().into_bytes();
        Self::json(status, body)
    }
}

pub struct IpListHandler {
    director: EndpointDirector,
    max_results: Option<usize>,
}

impl IpListHandler {
    pub fn new(director: EndpointDirector, max_results: Option<usize>) -> Self {
        Self {
            director,
            max_results,
        }
    }

    pub fn respond(&self, method: &Method, path: &str, ctx: &DispatchCtx) -> ApiResponse {
        let Ok(endpoint) = path.parse::<ApiEndpoint>() else {
            return ApiResponse::error(StatusCode::NOT_FOUND, "not found");
        };

        match endpoint {
            ApiEndpoint::IpList => {
                if *method != Method::GET {
                    return ApiResponse {
                        allow: Some("GET"),
                        ..ApiResponse::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
                    };
                }

                ip_list_response(self.ip_list(ctx), ctx)
            }
        }
    }

    /// Rank candidates and render the `/ip/list` body.
    ///
    /// A panic during dispatch is reported as an error instead of tearing down the worker.
    pub fn ip_list(&self, ctx: &DispatchCtx) -> Result<Vec<u8>, String> {
        let ranked = catch_panic(|| self.director.dispatch(ctx))?;

        let ranked = match self.max_results {
            Some(limit) => truncate_top(ranked, limit),
            None => ranked,
        };

        tracing::debug!(client = %ctx.client.ip, candidates = ranked.len(), "ip list dispatched");

        let response = IpListResponse {
            message: "ok".to_string(),
            code: 0,
            data: ranked.iter().map(EndpointView::from).collect(),
        };

        serde_json::to_vec(&response).map_err(|e| e.to_string())
    }
}

/// Map a rendered `/ip/list` body, or the reason it could not be produced, to a response.
pub(crate) fn ip_list_response(result: Result<Vec<u8>, String>, ctx: &DispatchCtx) -> ApiResponse {
    match result {
        Ok(body) => ApiResponse::json(StatusCode::OK, body),
        Err(err) => {
            tracing::error!(client = %ctx.client.ip, error = %err, "ip dispatch failed");
            ApiResponse::error(StatusCode::BAD_REQUEST, &err)
        }
    }
}

/// Run `f`, turning a panic into its message.
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "dispatch panicked".to_string()
    }
}
