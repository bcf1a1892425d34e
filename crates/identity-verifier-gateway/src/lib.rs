#![warn(missing_docs)]
//! # identity-verifier-gateway
//!
//! ## Purpose
//! Forwards `/api/*` calls from the client-facing origin to the verification
//! backend, so browsers never need to know where the backend runs.
//!
//! ## Responsibilities
//! - Validate the backend origin once at startup.
//! - Rewrite inbound requests to the backend ([`rewrite_request`]), keeping
//!   method, path, query, headers and body.
//! - Relay backend replies and report unreachable backends as 502/504.
//!
//! ## Data flow
//! Inbound request -> [`rewrite_request`] -> one outbound request -> backend
//! reply relayed to the caller.
//!
//! ## Ownership and lifetimes
//! The rewrite is a pure function over borrowed request parts returning an
//! owned [`ForwardRequest`]; the server keeps no per-request state.
//!
//! ## Error model
//! Startup problems return [`GatewayError`]. Per-request failures become HTTP
//! responses with a JSON `message` body; nothing is retried.
//!
//! ## Security and privacy notes
//! Hop-by-hop and proxy credential headers are never forwarded. Request bodies
//! are size-limited before forwarding.

mod server;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, Uri};
use thiserror::Error;
use url::Url;

pub use server::Gateway;

/// Path prefix forwarded to the backend.
pub const API_PREFIX: &str = "/api";

/// Default gateway listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Default limit on buffered request bodies (20 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Headers that describe one connection and must not cross the proxy.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Validated backend scheme/host/port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOrigin {
    scheme: String,
    authority: String,
    host_header: HeaderValue,
}

impl BackendOrigin {
    /// Parses an absolute `http(s)` URL; any path, query or fragment is ignored.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidBackend`] for non-http(s) or host-less
    /// URLs.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let raw = raw.trim();
        let parsed = Url::parse(raw)
            .map_err(|error| GatewayError::InvalidBackend(format!("{raw:?}: {error}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidBackend(format!(
                "{raw:?} must use http or https"
            )));
        }
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| GatewayError::InvalidBackend(format!("{raw:?} has no host")))?;

        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let host_header = HeaderValue::from_str(&authority)
            .map_err(|error| GatewayError::InvalidBackend(format!("{authority}: {error}")))?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            authority,
            host_header,
        })
    }

    /// Returns `scheme://authority`.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Returns `host[:port]`.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Outbound request derived from one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    /// Unchanged method.
    pub method: Method,
    /// Backend URL with the original path and query.
    pub url: String,
    /// Forwardable headers with `Host` pointing at the backend.
    pub headers: HeaderMap,
}

/// Returns `true` for `/api` and `/api/...` paths.
pub fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Rewrites an inbound request for the backend.
///
/// Returns `None` when the path is not under `/api`, checked both on the raw
/// path and after dot segments (`..`, `%2e%2e`) are resolved the way the
/// outbound client resolves them. Only scheme, host and port change; the
/// `/api` prefix, query, method and end-to-end headers are preserved.
/// `content-length` is dropped because the outbound client re-frames the body.
pub fn rewrite_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    origin: &BackendOrigin,
) -> Option<ForwardRequest> {
    if !is_api_path(uri.path()) {
        return None;
    }

    let path_and_query = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or(API_PREFIX);
    let url = Url::parse(&format!("{}{path_and_query}", origin.origin())).ok()?;
    if !is_api_path(url.path()) {
        return None;
    }

    let mut forwarded = forwardable_headers(headers);
    forwarded.remove(header::CONTENT_LENGTH);
    forwarded.insert(header::HOST, origin.host_header.clone());

    Some(ForwardRequest {
        method: method.clone(),
        url: url.into(),
        headers: forwarded,
    })
}

/// Copies headers minus hop-by-hop ones, including any named in `Connection`.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let hop = HOP_BY_HOP.contains(&name.as_str()) || connection_listed.contains(name);
        if !hop {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

/// Gateway runtime configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Client-facing listen address.
    pub listen: SocketAddr,
    /// Backend receiving forwarded calls.
    pub backend: BackendOrigin,
    /// Limit for establishing the backend connection.
    pub connect_timeout: Duration,
    /// Limit for one whole forwarded exchange.
    pub request_timeout: Duration,
    /// Largest request body accepted for forwarding.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    /// Creates a config with default timeouts and body limit.
    pub fn new(listen: SocketAddr, backend: BackendOrigin) -> Self {
        Self {
            listen,
            backend,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Gateway startup and serving errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend URL is malformed.
    #[error("invalid backend url: {0}")]
    InvalidBackend(String),
    /// Outbound HTTP client could not be built.
    #[error("gateway client setup failed: {0}")]
    Client(String),
    /// Socket bind or serve failure.
    #[error("gateway io failure: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the pure rewrite step.

    use super::*;

    fn origin() -> BackendOrigin {
        BackendOrigin::parse("http://backend.internal:8080/ignored/path")
            .expect("origin should parse")
    }

    #[test]
    fn rewrites_only_scheme_host_and_port() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("app.example.test"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=x"),
        );

        let uri: Uri = "/api/verifications?limit=50".parse().expect("uri should parse");
        let forward = rewrite_request(&Method::GET, &uri, &headers, &origin()).expect("api path");

        assert_eq!(forward.method, Method::GET);
        assert_eq!(forward.url, "http://backend.internal:8080/api/verifications?limit=50");
        assert_eq!(forward.headers[header::HOST], "backend.internal:8080");
        assert_eq!(forward.headers[header::AUTHORIZATION], "Bearer t");
        assert!(forward.headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn strips_hop_by_hop_and_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace-hop"));
        headers.insert("x-trace-hop", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert("x-request-id", HeaderValue::from_static("r-1"));

        let uri: Uri = "/api/verify".parse().expect("uri should parse");
        let forward = rewrite_request(&Method::POST, &uri, &headers, &origin()).expect("api path");

        assert!(!forward.headers.contains_key(header::CONNECTION));
        assert!(!forward.headers.contains_key("x-trace-hop"));
        assert!(!forward.headers.contains_key(header::TRANSFER_ENCODING));
        assert!(!forward.headers.contains_key(header::CONTENT_LENGTH));
        assert_eq!(forward.headers["x-request-id"], "r-1");
    }

    #[test]
    fn ignores_paths_outside_api() {
        let headers = HeaderMap::new();
        for path in ["/", "/index.html", "/apix", "/v1/api/verify"] {
            let uri: Uri = path.parse().expect("uri should parse");
            assert!(rewrite_request(&Method::GET, &uri, &headers, &origin()).is_none());
        }
        let uri: Uri = "/api".parse().expect("uri should parse");
        assert!(rewrite_request(&Method::GET, &uri, &headers, &origin()).is_some());
    }

    #[test]
    fn dot_segments_cannot_escape_api() {
        let headers = HeaderMap::new();
        for path in [
            "/api/../admin/secret",
            "/api/%2e%2e/admin/secret",
            "/api/%2E%2E/admin/secret",
            "/api/.%2e/admin/secret",
            "/api/verify/../../admin",
        ] {
            let uri: Uri = path.parse().expect("uri should parse");
            assert!(
                rewrite_request(&Method::GET, &uri, &headers, &origin()).is_none(),
                "{path} must not be forwarded"
            );
        }

        let uri: Uri = "/api/history/../verify?x=1".parse().expect("uri should parse");
        let forward = rewrite_request(&Method::POST, &uri, &headers, &origin()).expect("api path");
        assert_eq!(forward.url, "http://backend.internal:8080/api/verify?x=1");
    }

    #[test]
    fn backend_origin_validation() {
        assert!(BackendOrigin::parse("ftp://backend").is_err());
        assert!(BackendOrigin::parse("backend:8080").is_err());
        assert_eq!(
            BackendOrigin::parse("https://backend.example.test").expect("valid").origin(),
            "https://backend.example.test"
        );
    }
}
