//! Upstream Fetch
//!
//! The network side of the gateway: forwards a request to its target and
//! captures the answer as a snapshot. The trait seam keeps the strategies
//! testable without sockets.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use super::spaces::ResponseSnapshot;
use crate::error::{GatewayError, Result};

// == Outbound Request ==
/// A request as the interception layer sees it: method, full target URL,
/// original headers, and (for passthrough of non-GET traffic) the body.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    /// A bodyless GET for `url`, as the install step issues.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

// == Upstream Trait ==
/// Forwards requests to their target.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &OutboundRequest) -> Result<ResponseSnapshot>;
}

// == HTTP Implementation ==
/// Real upstream over reqwest.
///
/// A response is marked opaque when it was fetched from a host other than
/// the fronted site and carries no `Access-Control-Allow-Origin` grant;
/// such responses are relayed to the caller but never cached.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    site_host: Option<String>,
}

impl HttpUpstream {
    /// Creates an upstream client; `site_origin` is the fronted site, e.g.
    /// `http://localhost:3000`.
    pub fn new(site_origin: &str) -> Self {
        let site_host = Url::parse(site_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        Self {
            client: reqwest::Client::new(),
            site_host,
        }
    }

    fn is_cross_origin(&self, url: &Url) -> bool {
        match (&self.site_host, url.host_str()) {
            (Some(site), Some(host)) => site != host,
            _ => false,
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &OutboundRequest) -> Result<ResponseSnapshot> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            // Hop-by-hop and length headers are the client's business.
            if *name == header::HOST || *name == header::CONTENT_LENGTH {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.to_vec());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let mut headers = Vec::new();
        let mut allows_read = false;
        for (name, value) in response.headers() {
            if *name == header::ACCESS_CONTROL_ALLOW_ORIGIN {
                allows_read = true;
            }
            if let Ok(value) = value.to_str() {
                headers.push((name.to_string(), value.to_string()));
            }
        }
        let opaque = self.is_cross_origin(&request.url) && !allows_read;

        let body = Bytes::from(response.bytes().await?.to_vec());

        Ok(ResponseSnapshot {
            status,
            headers,
            body,
            opaque,
        })
    }
}
