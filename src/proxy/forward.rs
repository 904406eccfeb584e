//! Request forwarding to the backend origin.
//!
//! # Responsibilities
//! - Intercept requests whose path matches a proxy rule
//! - Rewrite path, Host and Origin, then send upstream
//! - Stream the backend response back to the client
//! - Map unreachable backends to 502 without retrying
//!
//! # Design Decisions
//! - Rule set lives behind `ArcSwap` so a reload never blocks requests
//! - Hop-by-hop headers are stripped in both directions
//! - Method, remaining headers and body are passed through untouched

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode, Uri, Version};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::ProxyLogLevel;
use crate::error::GatewayForwardError;
use crate::observability::metrics;
use crate::proxy::rule::{ProxyRule, ProxyTable};

/// HTTP client used for upstream requests.
pub type HttpClient = Client<HttpConnector, Body>;

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Result of offering a request to the proxy.
pub enum Intercept {
    /// A rule matched; this is the response for the client.
    Forwarded(Response<Body>),
    /// No rule matched; the request is handed back untouched.
    Passthrough(Request<Body>),
}

/// The dev-time API proxy.
pub struct DevProxy {
    table: ArcSwap<ProxyTable>,
    client: HttpClient,
}

impl DevProxy {
    pub fn new(table: ProxyTable) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            table: ArcSwap::from_pointee(table),
            client,
        }
    }

    /// Current rule set.
    pub fn rules(&self) -> Arc<ProxyTable> {
        self.table.load_full()
    }

    /// Atomically replace the rule set.
    pub fn swap(&self, table: ProxyTable) {
        tracing::info!(rules = table.len(), "Proxy rules replaced");
        self.table.store(Arc::new(table));
    }

    /// Forward `request` if a rule claims it.
    pub async fn intercept(&self, request: Request<Body>) -> Intercept {
        let table = self.table.load_full();
        let Some(rule) = table.find(request.uri().path()) else {
            return Intercept::Passthrough(request);
        };
        Intercept::Forwarded(self.forward(rule, request).await)
    }

    async fn forward(&self, rule: &ProxyRule, request: Request<Body>) -> Response<Body> {
        let start_time = Instant::now();
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match send(&self.client, rule, request).await {
            Ok(response) => {
                let status = response.status();
                if rule.permits(ProxyLogLevel::Info) {
                    tracing::info!(request_id = %request_id, method = %method, path = %path, status = %status, "Proxied request completed");
                }
                metrics::record_proxy_request(status.as_u16(), start_time);
                response
            }
            Err(e) => {
                if rule.permits(ProxyLogLevel::Error) {
                    tracing::error!(request_id = %request_id, method = %method, path = %path, error = %e, "Proxy error");
                }
                metrics::record_proxy_request(StatusCode::BAD_GATEWAY.as_u16(), start_time);
                (StatusCode::BAD_GATEWAY, format!("Error occurred while proxying request {path}: {e}"))
                    .into_response()
            }
        }
    }
}

/// Send one request upstream according to `rule`.
pub async fn send(
    client: &HttpClient,
    rule: &ProxyRule,
    request: Request<Body>,
) -> Result<Response<Body>, GatewayForwardError> {
    let (parts, body) = request.into_parts();
    let target = rule.target_url(parts.uri.path(), parts.uri.query());
    let uri: Uri = target
        .parse()
        .map_err(|_| GatewayForwardError::InvalidTarget { uri: target.clone() })?;

    if rule.permits(ProxyLogLevel::Debug) {
        tracing::debug!(
            method = %parts.method,
            from = %parts.uri,
            to = %target,
            change_origin = rule.change_origin(),
            "Forwarding request"
        );
    }

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    if rule.change_origin() {
        override_origin(&mut headers, rule)?;
    }

    let mut upstream = Request::builder()
        .method(parts.method)
        .uri(uri)
        .version(Version::HTTP_11)
        .body(body)
        .map_err(|_| GatewayForwardError::InvalidTarget { uri: target.clone() })?;
    *upstream.headers_mut() = headers;

    let response: Response<Incoming> = client
        .request(upstream)
        .await
        .map_err(|source| GatewayForwardError::Upstream {
            target: target.clone(),
            source,
        })?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)))
}

fn override_origin(headers: &mut HeaderMap, rule: &ProxyRule) -> Result<(), GatewayForwardError> {
    let invalid = || GatewayForwardError::InvalidTarget {
        uri: rule.origin().to_string(),
    };
    headers.insert(
        header::HOST,
        HeaderValue::from_str(rule.authority()).map_err(|_| invalid())?,
    );
    if headers.contains_key(header::ORIGIN) {
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_str(rule.origin()).map_err(|_| invalid())?,
        );
    }
    Ok(())
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
