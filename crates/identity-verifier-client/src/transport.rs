//! Transport seam between the verification client and the network.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use url::Url;

/// Multipart field name carrying the document.
pub const DOCUMENT_FIELD: &str = "file";

/// Document bytes plus the metadata sent alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// File name reported to the backend.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Raw document content.
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Creates an upload, guessing the content type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// One outbound API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// Plain `GET`.
    Get {
        /// Resolved URL, absolute or same-origin relative.
        url: String,
    },
    /// `POST` of a single-field multipart form.
    Multipart {
        /// Resolved URL, absolute or same-origin relative.
        url: String,
        /// Form field name.
        field: String,
        /// File carried by the field.
        document: DocumentUpload,
    },
}

impl ApiRequest {
    /// Returns the target URL.
    pub fn url(&self) -> &str {
        match self {
            ApiRequest::Get { url } | ApiRequest::Multipart { url, .. } => url,
        }
    }
}

/// Raw HTTP reply as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase; may be empty.
    pub status_text: String,
    /// Undecoded body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a never-empty status description.
    pub fn status_text(&self) -> String {
        let text = self.status_text.trim();
        if text.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            text.to_string()
        }
    }
}

/// Abstract transport used by the verification client.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends one request and returns whatever the server answered.
    ///
    /// # Errors
    /// Returns [`TransportError`] only when no response was received.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    origin: Option<Url>,
}

impl ReqwestTransport {
    /// Creates a transport.
    ///
    /// `origin` is the client-facing origin used to dial same-origin relative
    /// URLs; without it only absolute URLs can be requested.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] when the HTTP client cannot be built.
    pub fn new(origin: Option<Url>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("identity-verifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| TransportError::Setup(error.to_string()))?;
        Ok(Self { client, origin })
    }

    fn absolute(&self, url: &str) -> Result<Url, TransportError> {
        match Url::parse(url) {
            Ok(parsed) => Ok(parsed),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = self.origin.as_ref().ok_or_else(|| {
                    TransportError::InvalidUrl(format!(
                        "{url} is same-origin but no origin is configured"
                    ))
                })?;
                origin
                    .join(url)
                    .map_err(|error| TransportError::InvalidUrl(format!("{url}: {error}")))
            }
            Err(error) => Err(TransportError::InvalidUrl(format!("{url}: {error}"))),
        }
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let builder = match request {
            ApiRequest::Get { url } => self.client.get(self.absolute(&url)?),
            ApiRequest::Multipart {
                url,
                field,
                document,
            } => {
                let part = Part::bytes(document.bytes)
                    .file_name(document.file_name)
                    .mime_str(&document.content_type)
                    .map_err(|error| TransportError::Request(error.to_string()))?;
                self.client
                    .post(self.absolute(&url)?)
                    .multipart(Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::Body(error.to_string()))?;

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// HTTP client could not be constructed.
    #[error("transport setup failed: {0}")]
    Setup(String),
    /// URL could not be turned into a dialable address.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    /// Connection or request failure.
    #[error("request failed: {0}")]
    Request(String),
    /// Response body could not be read.
    #[error("response body unreadable: {0}")]
    Body(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for upload metadata and URL resolution.

    use super::*;

    #[test]
    fn guesses_document_content_types() {
        assert_eq!(DocumentUpload::new("id.JPG", vec![]).content_type, "image/jpeg");
        assert_eq!(DocumentUpload::new("scan.pdf", vec![]).content_type, "application/pdf");
        assert_eq!(
            DocumentUpload::new("noext", vec![]).content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn relative_urls_need_an_origin() {
        let detached = ReqwestTransport::new(None).expect("client should build");
        assert!(matches!(
            detached.absolute("/api/verify"),
            Err(TransportError::InvalidUrl(_))
        ));

        let origin = Url::parse("http://127.0.0.1:5000").expect("origin should parse");
        let attached = ReqwestTransport::new(Some(origin)).expect("client should build");
        assert_eq!(
            attached.absolute("/api/verify").expect("joined url").as_str(),
            "http://127.0.0.1:5000/api/verify"
        );
    }

    #[test]
    fn blank_reason_phrase_falls_back_to_code() {
        let response = ApiResponse {
            status: 599,
            status_text: String::new(),
            body: Vec::new(),
        };
        assert_eq!(response.status_text(), "HTTP 599");
    }
}
