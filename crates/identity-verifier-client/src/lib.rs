#![warn(missing_docs)]
//! # identity-verifier-client
//!
//! ## Purpose
//! Submits identity documents for verification and reads the auxiliary
//! read-only endpoints of the verification service.
//!
//! ## Responsibilities
//! - Build the single-field multipart upload for `POST /api/verify`.
//! - Turn non-success replies into one readable message, even when the error
//!   body is empty or garbled.
//! - Drive normalization and schema validation on success.
//! - Fetch health, statistics and verification history.
//!
//! ## Data flow
//! [`DocumentUpload`] -> [`VerificationClient::verify`] -> [`ApiTransport`] ->
//! [`ApiResponse`] -> normalize -> validate -> [`VerificationResult`].
//!
//! ## Ownership and lifetimes
//! The client holds only immutable configuration and a shared transport. Each
//! call owns its request and response, so concurrent calls never interact and
//! dropping a pending future leaves nothing behind.
//!
//! ## Error model
//! Every failure ends the call with one [`VerificationError`]. Nothing is
//! retried: a duplicate submission could be billed or recorded twice.
//!
//! ## Security and privacy notes
//! Document bytes are never logged; a SHA-256 fingerprint identifies the
//! upload instead. Extracted fields are masked before raw payloads are logged.

mod transport;

use std::sync::Arc;

use identity_verifier_contract::{
    ContractError, ErrorPayload, VerificationRecord, VerificationResult, VerificationStats,
    normalize, parse_records, parse_stats, validate,
};
use identity_verifier_endpoints::{
    ApiBase, ConfigError, EndpointSet, VERIFICATION_BY_ID_PATH, path_segment,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use transport::{
    ApiRequest, ApiResponse, ApiTransport, DOCUMENT_FIELD, DocumentUpload, ReqwestTransport,
    TransportError,
};

/// Message shown when a successful reply breaks the result contract.
pub const INVALID_RESULT_MESSAGE: &str =
    "Verification failed: the service returned an invalid result";

/// Message shown when a successful reply is not JSON.
pub const UNREADABLE_RESULT_MESSAGE: &str =
    "Verification failed: the service returned an unreadable response";

const REDACTED: &str = "<redacted>";
const MAX_LOGGED_BODY_CHARS: usize = 512;

/// Client for the verification API.
#[derive(Clone)]
pub struct VerificationClient {
    base: ApiBase,
    endpoints: EndpointSet,
    transport: Arc<dyn ApiTransport>,
}

impl VerificationClient {
    /// Creates a client for an already validated base.
    pub fn new(base: ApiBase, transport: Arc<dyn ApiTransport>) -> Self {
        let endpoints = EndpointSet::resolve(&base);
        Self {
            base,
            endpoints,
            transport,
        }
    }

    /// Creates a client from a raw configured base value.
    ///
    /// # Errors
    /// Returns [`VerificationError::Config`] when the base is malformed.
    pub fn from_config(
        raw_base: Option<&str>,
        transport: Arc<dyn ApiTransport>,
    ) -> Result<Self, VerificationError> {
        Ok(Self::new(ApiBase::parse(raw_base)?, transport))
    }

    /// Returns the resolved endpoint set.
    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// Submits one document and returns the validated result.
    ///
    /// # Errors
    /// - [`VerificationError::Transport`] when no response arrived.
    /// - [`VerificationError::Http`] for non-success statuses.
    /// - [`VerificationError::Decode`] when a success body is not JSON.
    /// - [`VerificationError::SchemaViolation`] when a success body is invalid
    ///   after normalization.
    pub async fn verify(
        &self,
        document: DocumentUpload,
    ) -> Result<VerificationResult, VerificationError> {
        let fingerprint = document_fingerprint(&document.bytes);
        info!(
            fingerprint = %fingerprint,
            size_bytes = document.bytes.len(),
            content_type = %document.content_type,
            "submitting document for verification"
        );

        let body = self
            .fetch(ApiRequest::Multipart {
                url: self.endpoints.verify.clone(),
                field: DOCUMENT_FIELD.to_string(),
                document,
            })
            .await?;

        let raw: Value = serde_json::from_slice(&body).map_err(|error| {
            warn!(
                fingerprint = %fingerprint,
                body = %loggable_body(&body),
                "verification response is not JSON"
            );
            VerificationError::Decode(error.to_string())
        })?;

        let result = validate(&normalize(raw)).map_err(|error| {
            warn!(
                fingerprint = %fingerprint,
                body = %loggable_body(&body),
                %error,
                "verification response violates the result schema"
            );
            VerificationError::from(error)
        })?;

        info!(
            fingerprint = %fingerprint,
            risk_score = result.risk_score,
            risk_tier = result.risk_tier().as_str(),
            findings = result.explanation.len(),
            "verification completed"
        );
        Ok(result)
    }

    /// Reads the liveness probe. Its shape is not constrained.
    ///
    /// # Errors
    /// Returns [`VerificationError`] for transport, HTTP or decode failures.
    pub async fn health(&self) -> Result<Value, VerificationError> {
        let body = self.get(self.endpoints.health.clone()).await?;
        serde_json::from_slice(&body).map_err(|error| VerificationError::Decode(error.to_string()))
    }

    /// Reads aggregate verification counters.
    ///
    /// # Errors
    /// Returns [`VerificationError`] for transport, HTTP or decode failures.
    pub async fn stats(&self) -> Result<VerificationStats, VerificationError> {
        let body = self.get(self.endpoints.stats.clone()).await?;
        Ok(parse_stats(&body)?)
    }

    /// Lists the most recent verifications, newest first as sent by the server.
    ///
    /// # Errors
    /// Returns [`VerificationError`] for transport, HTTP, decode or schema
    /// failures.
    pub async fn recent_verifications(
        &self,
        limit: u32,
    ) -> Result<Vec<VerificationRecord>, VerificationError> {
        let url = format!("{}?limit={limit}", self.endpoints.verifications);
        let body = self.get(url).await?;
        let records = parse_records(&body)?;
        debug!(count = records.len(), limit, "fetched verification history");
        Ok(records)
    }

    /// Fetches one historical verification.
    ///
    /// The id is percent-encoded as a single path segment.
    ///
    /// # Errors
    /// Returns [`VerificationError::InvalidId`] for empty, `.` or `..` ids
    /// without sending anything, [`VerificationError::Http`] with status 404
    /// for unknown ids, and other [`VerificationError`] variants as for
    /// [`Self::recent_verifications`].
    pub async fn verification_by_id(
        &self,
        id: &str,
    ) -> Result<VerificationRecord, VerificationError> {
        let segment =
            path_segment(id).ok_or_else(|| VerificationError::InvalidId(id.to_string()))?;
        let url = self
            .base
            .build_url(VERIFICATION_BY_ID_PATH, &[("id", segment.as_str())]);
        let body = self.get(url).await?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|error| VerificationError::Decode(error.to_string()))?;
        Ok(VerificationRecord::from_value(value)?)
    }

    async fn get(&self, url: String) -> Result<Vec<u8>, VerificationError> {
        self.fetch(ApiRequest::Get { url }).await
    }

    async fn fetch(&self, request: ApiRequest) -> Result<Vec<u8>, VerificationError> {
        let url = request.url().to_string();
        let response = self.transport.send(request).await.map_err(|error| {
            warn!(url = %url, %error, "request failed before any response");
            VerificationError::Transport(error)
        })?;

        if !response.is_success() {
            let message = http_error_message(&response);
            warn!(url = %url, status = response.status, message = %message, "request rejected");
            return Err(VerificationError::Http {
                status: response.status,
                message,
            });
        }

        Ok(response.body)
    }
}

/// Extracts the message for a non-success reply.
///
/// Order: non-blank `message`, then first non-blank `explanation` entry, then
/// the status text. Unparsable bodies fall straight to the status text, so the
/// result is never empty.
pub fn http_error_message(response: &ApiResponse) -> String {
    ErrorPayload::from_body(&response.body)
        .and_then(|payload| payload.best_message())
        .unwrap_or_else(|| response.status_text())
}

/// Hex SHA-256 digest of document bytes, used to correlate logs.
pub fn document_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn loggable_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            mask_extracted_data(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body)
            .chars()
            .take(MAX_LOGGED_BODY_CHARS)
            .collect(),
    }
}

fn mask_extracted_data(value: &mut Value) {
    if let Some(Value::Object(fields)) = value.get_mut("extractedData") {
        for field in fields.values_mut() {
            if !matches!(field, Value::Null) && field.as_str() != Some("") {
                *field = Value::String(REDACTED.to_string());
            }
        }
    }
}

/// Errors that end a client call.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No response was received.
    #[error("{0}")]
    Transport(#[from] TransportError),
    /// Server answered with a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body or status text.
        message: String,
    },
    /// Success body was not JSON.
    #[error("response is not valid JSON: {0}")]
    Decode(String),
    /// Success body broke the result contract after normalization.
    #[error("result schema violation: {0}")]
    SchemaViolation(String),
    /// Configured base was malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Record id cannot be expressed as one path segment.
    #[error("invalid verification id {0:?}")]
    InvalidId(String),
}

impl From<ContractError> for VerificationError {
    fn from(error: ContractError) -> Self {
        match error {
            ContractError::Decode(error) => Self::Decode(error.to_string()),
            ContractError::SchemaViolation(detail) => Self::SchemaViolation(detail),
        }
    }
}

impl VerificationError {
    /// Returns the non-empty message shown to users.
    ///
    /// Contract breaches get a generic message; their details go to logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Decode(_) => UNREADABLE_RESULT_MESSAGE.to_string(),
            Self::SchemaViolation(_) => INVALID_RESULT_MESSAGE.to_string(),
            Self::Transport(error) => error.to_string(),
            Self::Config(error) => error.to_string(),
            Self::InvalidId(_) => self.to_string(),
        }
    }

    /// Returns the HTTP status for [`Self::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
