#![warn(missing_docs)]
//! # identity-verifier-app
//!
//! ## Purpose
//! Wires configuration, logging, the verification client and the gateway into
//! the `identity-verifier` command-line tool.
//!
//! ## Responsibilities
//! - Resolve client settings from the environment/CLI, failing fast on bad or
//!   missing configuration.
//! - Initialise structured logging.
//! - Render validated results and read-only views as terminal text.
//! - Redact secrets and personal data from log-bound strings.
//!
//! ## Data flow
//! CLI flags/env -> [`ClientSettings::resolve`] -> [`build_client`] ->
//! verification calls -> [`summarize_result`] -> stdout.
//!
//! ## Ownership and lifetimes
//! Settings are resolved once and moved into the client; nothing is reloaded
//! while the process runs.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`], whose
//! [`AppError::user_message`] is always non-empty.
//!
//! ## Security and privacy notes
//! - No fallback host exists: the client refuses to start without either an
//!   API base or an explicit same-origin origin.
//! - [`redact_sensitive`] strips credentials and document identifiers.

mod logging;
mod render;

use std::sync::Arc;

use identity_verifier_client::{
    ReqwestTransport, TransportError, VerificationClient, VerificationError,
};
use identity_verifier_endpoints::{ApiBase, ConfigError};
use identity_verifier_gateway::GatewayError;
use thiserror::Error;
use url::Url;

pub use logging::{LogFormat, init_logging};
pub use render::{FindingKind, UNREADABLE, summarize_history, summarize_result, summarize_stats};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("IDENTITY_VERIFIER_VERSION");

/// Environment variable naming the backend base URL.
pub const API_BASE_ENV: &str = "IDV_API_BASE_URL";

/// Environment variable naming the client-facing origin for same-origin use.
pub const ORIGIN_ENV: &str = "IDV_ORIGIN";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base every endpoint is resolved against.
    pub base: ApiBase,
    /// Origin used to dial same-origin relative paths.
    pub origin: Option<Url>,
}

impl ClientSettings {
    /// Resolves settings from raw configuration values.
    ///
    /// Same-origin mode needs an explicit `origin`; a missing base is never
    /// replaced by a default host.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for malformed values, or when neither a
    /// base nor an origin is configured.
    pub fn resolve(api_base: Option<&str>, origin: Option<&str>) -> Result<Self, AppError> {
        let base = ApiBase::parse(api_base)?;
        let origin = origin
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(parse_origin)
            .transpose()?;

        if base.is_same_origin() && origin.is_none() {
            return Err(AppError::Config(ConfigError::Missing(format!(
                "set {API_BASE_ENV}, or {ORIGIN_ENV} when serving behind the gateway"
            ))));
        }

        Ok(Self { base, origin })
    }
}

fn parse_origin(raw: &str) -> Result<Url, ConfigError> {
    let origin = Url::parse(raw)
        .map_err(|error| ConfigError::InvalidBase(format!("origin {raw:?}: {error}")))?;
    if !matches!(origin.scheme(), "http" | "https") || origin.host_str().is_none() {
        return Err(ConfigError::InvalidBase(format!(
            "origin {raw:?} must be an http(s) URL with a host"
        )));
    }
    Ok(origin)
}

/// Builds a network-backed client.
///
/// # Errors
/// Returns [`AppError::Transport`] when the HTTP client cannot be built.
pub fn build_client(settings: ClientSettings) -> Result<VerificationClient, AppError> {
    let transport = ReqwestTransport::new(settings.origin)?;
    Ok(VerificationClient::new(settings.base, Arc::new(transport)))
}

/// Redacts common secret and identity markers in log-safe output.
///
/// A key only counts as a whole word: the characters around it must not be
/// ASCII letters or digits, so `adobe_scan.jpg` or `tokens` are left alone
/// while `access_token=` or `"idNumber":` are caught. Everything after the
/// first sensitive key is replaced, so values that contain spaces (such as
/// `Bearer <token>`) cannot leak.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let first = SENSITIVE_KEYS
        .iter()
        .filter_map(|key| find_word(&lower, key).map(|position| (position, *key)))
        .min_by_key(|(position, _)| *position);

    match first {
        Some((position, key)) => format!("{}{key}=<redacted>", &input[..position]),
        None => input.to_string(),
    }
}

fn find_word(haystack: &str, word: &str) -> Option<usize> {
    haystack
        .match_indices(word)
        .map(|(position, _)| position)
        .find(|&position| {
            let before = haystack[..position].chars().next_back();
            let after = haystack[position + word.len()..].chars().next();
            !before.is_some_and(|ch| ch.is_ascii_alphanumeric())
                && !after.is_some_and(|ch| ch.is_ascii_alphanumeric())
        })
}

const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "authorization",
    "bearer",
    "idnumber",
    "dob",
];

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is malformed or missing.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// HTTP client could not be created.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Verification call failed.
    #[error("{0}")]
    Verification(#[from] VerificationError),
    /// Gateway failed to start or serve.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    /// Log subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
}

impl AppError {
    /// Returns the non-empty message shown to users.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Verification(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings resolution.

    use super::*;

    #[test]
    fn same_origin_requires_explicit_origin() {
        let error = ClientSettings::resolve(None, None).expect_err("no base, no origin");
        assert!(matches!(error, AppError::Config(ConfigError::Missing(_))));

        let settings = ClientSettings::resolve(Some(""), Some("http://127.0.0.1:5000"))
            .expect("origin makes same-origin explicit");
        assert!(settings.base.is_same_origin());
    }

    #[test]
    fn malformed_values_fail_fast() {
        assert!(ClientSettings::resolve(Some("http//broken"), None).is_err());
        assert!(ClientSettings::resolve(None, Some("file:///tmp")).is_err());
    }

    #[test]
    fn redaction_picks_earliest_marker() {
        assert_eq!(
            redact_sensitive("upload failed dob=1990 token=abc"),
            "upload failed dob=<redacted>"
        );
        assert_eq!(redact_sensitive("nothing secret"), "nothing secret");
    }
}
