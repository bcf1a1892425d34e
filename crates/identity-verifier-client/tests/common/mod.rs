//! Shared fixtures for client integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use identity_verifier_client::{
    ApiRequest, ApiResponse, ApiTransport, DocumentUpload, TransportError, VerificationClient,
};
use identity_verifier_endpoints::ApiBase;

/// Transport that replays scripted replies and records every request.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Creates a transport replaying `replies` in order.
    pub fn new(replies: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("request lock should work").clone()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request);
        self.replies
            .lock()
            .expect("reply lock should work")
            .pop_front()
            .expect("a reply should be scripted for every request")
    }
}

/// Builds a raw reply.
#[allow(dead_code)]
pub fn reply(status: u16, status_text: &str, body: &str) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        status_text: status_text.to_string(),
        body: body.as_bytes().to_vec(),
    })
}

/// Builds a client against an absolute test base.
#[allow(dead_code)]
pub fn client_with(transport: Arc<dyn ApiTransport>) -> VerificationClient {
    let base = ApiBase::parse(Some("https://verifier.example.test:8080/"))
        .expect("test base should parse");
    VerificationClient::new(base, transport)
}

/// Small JPEG-named fixture document.
#[allow(dead_code)]
pub fn fixture_document() -> DocumentUpload {
    DocumentUpload::new("passport.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])
}
