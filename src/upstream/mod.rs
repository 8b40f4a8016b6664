//! Upstream forwarding transport.
//!
//! # Responsibilities
//! - Define the per-backend forwarding capability (`Transport`)
//! - Rewrite the request target onto the backend origin and forward it
//!
//! # Design Decisions
//! - The balancer decides WHICH backend serves and HOW OFTEN to retry;
//!   connection reuse, streaming and header mechanics belong to the
//!   hyper-util client behind this seam
//! - Forwarding failures surface as `Err`, consumed by the gateway's
//!   retry/failover loop

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use thiserror::Error;
use url::Url;

use crate::error::BalancerError;

/// Errors raised while forwarding a request to an upstream.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream request failed: {0}")]
    Forward(#[from] hyper_util::client::legacy::Error),

    #[error("invalid upstream uri: {0}")]
    Uri(#[from] axum::http::uri::InvalidUriParts),

    #[error("upstream unreachable: {0}")]
    Io(#[from] std::io::Error),
}

/// Forwarding capability owned by a single backend.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Forward one request to the upstream and return its response.
    async fn serve(&self, req: Request<Body>) -> Result<Response<Body>, TransportError>;
}

/// HTTP transport over the shared hyper-util legacy client.
///
/// The origin's scheme and authority are resolved once at construction;
/// `serve` grafts them onto each request's URI, keeping path and query.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("scheme", &self.scheme)
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(client: Client<HttpConnector, Body>, origin: &Url) -> Result<Self, BalancerError> {
        let invalid = || BalancerError::InvalidAddress(origin.to_string());

        let scheme = match origin.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            _ => return Err(invalid()),
        };

        let host = origin.host_str().ok_or_else(invalid)?;
        let authority = match origin.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|_| invalid())?;

        Ok(Self {
            client,
            scheme,
            authority,
        })
    }

    fn rewrite_uri(&self, uri: Uri) -> Result<Uri, TransportError> {
        let mut parts = uri.into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Ok(Uri::from_parts(parts)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn serve(&self, req: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (mut parts, body) = req.into_parts();
        parts.uri = self.rewrite_uri(parts.uri)?;

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
