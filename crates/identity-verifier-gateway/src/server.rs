//! Axum-based forwarding server.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{BackendOrigin, GatewayConfig, GatewayError, forwardable_headers, rewrite_request};

struct GatewayState {
    backend: BackendOrigin,
    client: reqwest::Client,
    max_body_bytes: usize,
}

/// Stateless `/api/*` forwarder.
#[derive(Clone)]
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Builds the outbound client from config.
    ///
    /// Redirects are relayed to the caller rather than followed.
    ///
    /// # Errors
    /// Returns [`GatewayError::Client`] when the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|error| GatewayError::Client(error.to_string()))?;

        Ok(Self {
            state: Arc::new(GatewayState {
                backend: config.backend.clone(),
                client,
                max_body_bytes: config.max_body_bytes,
            }),
        })
    }

    /// Returns a router forwarding every request through the gateway.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(forward)
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns [`GatewayError::Io`] when serving fails.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            listen = %listener.local_addr()?,
            backend = %self.state.backend.origin(),
            "gateway listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn forward(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();

    let Some(outbound) = rewrite_request(&method, &uri, &headers, &state.backend) else {
        return failure(StatusCode::NOT_FOUND, "Not found");
    };

    let body = match body {
        Ok(body) => body,
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(error))) => {
            warn!(path = %uri.path(), %error, "inbound body over limit");
            return failure(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!("Request body exceeds {} bytes", state.max_body_bytes),
            );
        }
        Err(rejection) => {
            warn!(path = %uri.path(), error = %rejection, "inbound body unreadable");
            return failure(StatusCode::BAD_REQUEST, "Request body could not be read");
        }
    };

    let reply = state
        .client
        .request(outbound.method.clone(), outbound.url.as_str())
        .headers(outbound.headers)
        .body(body)
        .send()
        .await;

    let reply = match reply {
        Ok(reply) => reply,
        Err(error) => {
            let status = if error.is_timeout() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_GATEWAY
            };
            warn!(
                method = %outbound.method,
                url = %outbound.url,
                status = status.as_u16(),
                %error,
                "backend unreachable"
            );
            return failure(status, "Verification service is unreachable");
        }
    };

    let status = reply.status();
    let headers = forwardable_headers(reply.headers());
    let bytes = match reply.bytes().await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(url = %outbound.url, %error, "backend reply body unreadable");
            return failure(StatusCode::BAD_GATEWAY, "Verification service reply was cut short");
        }
    };

    info!(
        method = %outbound.method,
        path = %uri.path(),
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "forwarded"
    );

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response.headers_mut().remove(axum::http::header::CONTENT_LENGTH);
    response
}

fn failure(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "message": message });
    (status, axum::Json(body)).into_response()
}
