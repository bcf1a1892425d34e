#![warn(missing_docs)]
//! # identity-verifier-endpoints
//!
//! ## Purpose
//! Resolves every logical API endpoint from one configured base.
//!
//! ## Responsibilities
//! - Validate the configured base URL once, at startup.
//! - Produce an immutable [`EndpointSet`] of absolute or same-origin URLs.
//! - Build ad-hoc URLs with `:key` placeholder substitution.
//!
//! ## Data flow
//! Configuration value -> [`ApiBase::parse`] -> [`EndpointSet::resolve`] ->
//! client requests.
//!
//! ## Ownership and lifetimes
//! Resolved URLs are owned `String`s so the set can be shared read-only for the
//! whole process lifetime.
//!
//! ## Error model
//! Malformed bases return [`ConfigError`]. URL building never fails:
//! unmatched placeholders are left verbatim.
//!
//! ## Security and privacy notes
//! There is no hardcoded fallback host. An unset base means same-origin
//! relative paths, never an implicit remote address.
//!
//! ## Example
//! ```rust
//! use identity_verifier_endpoints::{ApiBase, EndpointSet};
//!
//! let endpoints = EndpointSet::resolve(&ApiBase::parse(None).unwrap());
//! assert_eq!(endpoints.verify, "/api/verify");
//! ```

use thiserror::Error;
use url::{Url, form_urlencoded};

/// Path template for single-record lookup.
pub const VERIFICATION_BY_ID_PATH: &str = "/api/verifications/:id";

/// Logical API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Liveness probe.
    Health,
    /// Document submission.
    Verify,
    /// Verification history.
    Verifications,
    /// Aggregate counters.
    Stats,
    /// Session login.
    Login,
    /// Session logout.
    Logout,
}

impl Endpoint {
    /// All logical endpoints in declaration order.
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Health,
        Endpoint::Verify,
        Endpoint::Verifications,
        Endpoint::Stats,
        Endpoint::Login,
        Endpoint::Logout,
    ];

    /// Fixed path relative to the base.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "/api/health",
            Endpoint::Verify => "/api/verify",
            Endpoint::Verifications => "/api/verifications",
            Endpoint::Stats => "/api/stats",
            Endpoint::Login => "/api/auth/login",
            Endpoint::Logout => "/api/auth/logout",
        }
    }

    /// Upper-case logical name.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Health => "HEALTH",
            Endpoint::Verify => "VERIFY",
            Endpoint::Verifications => "VERIFICATIONS",
            Endpoint::Stats => "STATS",
            Endpoint::Login => "LOGIN",
            Endpoint::Logout => "LOGOUT",
        }
    }
}

/// Validated API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBase {
    /// Relative `/api/...` paths against whatever origin serves the client.
    SameOrigin,
    /// Absolute `http(s)` base without trailing slash.
    Absolute(String),
}

impl ApiBase {
    /// Parses a configured base value.
    ///
    /// `None`, empty and whitespace-only values mean same-origin.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBase`] when the value is not an absolute
    /// `http`/`https` URL with a host, or carries a query or fragment.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::SameOrigin);
        };

        let parsed = Url::parse(raw)
            .map_err(|error| ConfigError::InvalidBase(format!("{raw:?} is not a URL: {error}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBase(format!(
                "{raw:?} must use http or https"
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidBase(format!("{raw:?} has no host")));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConfigError::InvalidBase(format!(
                "{raw:?} must not carry a query or fragment"
            )));
        }

        Ok(Self::Absolute(raw.trim_end_matches('/').to_string()))
    }

    /// Returns the base prefix; empty for same-origin.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SameOrigin => "",
            Self::Absolute(base) => base,
        }
    }

    /// Returns `true` for same-origin configuration.
    pub fn is_same_origin(&self) -> bool {
        matches!(self, Self::SameOrigin)
    }

    /// Joins a path onto the base, adding a leading `/` when missing.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.as_str())
        } else {
            format!("{}/{path}", self.as_str())
        }
    }

    /// Builds a URL from an endpoint or path and substitutes placeholders.
    ///
    /// Fully-qualified `http(s)` URLs are not re-based. Relative paths are
    /// joined onto this base. Each `:key` whose key appears in `params` is
    /// replaced by its value; other placeholders stay as they are.
    pub fn build_url(&self, endpoint_or_path: &str, params: &[(&str, &str)]) -> String {
        let url = if is_absolute_url(endpoint_or_path) {
            endpoint_or_path.to_string()
        } else {
            self.join(endpoint_or_path)
        };
        substitute_placeholders(&url, params)
    }
}

fn is_absolute_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Replaces `:key` placeholders whose key appears in `params`.
///
/// Keys are identifiers (`[A-Za-z_][A-Za-z0-9_]*`), so ports such as `:8080`
/// and the `://` of a scheme are never treated as placeholders.
pub fn substitute_placeholders(template: &str, params: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(colon) = rest.find(':') {
        output.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let key_len = placeholder_len(after);

        let key = &after[..key_len];
        match params.iter().find(|(name, _)| key_len > 0 && *name == key) {
            Some((_, value)) => output.push_str(value),
            None => {
                output.push(':');
                output.push_str(key);
            }
        }
        rest = &after[key_len..];
    }

    output.push_str(rest);
    output
}

/// Percent-encodes `value` for use as exactly one path segment.
///
/// `/`, `?`, `#` and `%` are escaped, so the value cannot change the request
/// target. Returns `None` for empty values and for `.`/`..`, which URL
/// parsers resolve as dot segments even when escaped.
pub fn path_segment(value: &str) -> Option<String> {
    if matches!(value, "" | "." | "..") {
        return None;
    }
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    Some(encoded.replace('+', "%20"))
}

fn placeholder_len(input: &str) -> usize {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, first)) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_'))
        .map(|(index, _)| index)
        .unwrap_or(input.len())
}

/// Resolved URLs for every logical endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    /// `HEALTH` URL.
    pub health: String,
    /// `VERIFY` URL.
    pub verify: String,
    /// `VERIFICATIONS` URL.
    pub verifications: String,
    /// `STATS` URL.
    pub stats: String,
    /// `LOGIN` URL.
    pub login: String,
    /// `LOGOUT` URL.
    pub logout: String,
}

impl EndpointSet {
    /// Resolves every endpoint against one base.
    pub fn resolve(base: &ApiBase) -> Self {
        Self {
            health: base.join(Endpoint::Health.path()),
            verify: base.join(Endpoint::Verify.path()),
            verifications: base.join(Endpoint::Verifications.path()),
            stats: base.join(Endpoint::Stats.path()),
            login: base.join(Endpoint::Login.path()),
            logout: base.join(Endpoint::Logout.path()),
        }
    }

    /// Returns the resolved URL for one endpoint.
    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Health => &self.health,
            Endpoint::Verify => &self.verify,
            Endpoint::Verifications => &self.verifications,
            Endpoint::Stats => &self.stats,
            Endpoint::Login => &self.login,
            Endpoint::Logout => &self.logout,
        }
    }

    /// Iterates `(name, url)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Endpoint::ALL
            .into_iter()
            .map(move |endpoint| (endpoint.name(), self.url(endpoint)))
    }
}

/// Configuration errors raised once at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Configured base URL is malformed.
    #[error("invalid API base: {0}")]
    InvalidBase(String),
    /// Neither a base nor an explicit same-origin origin was configured.
    #[error("no API base configured: {0}")]
    Missing(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for base parsing and placeholder handling.

    use super::*;

    #[test]
    fn rejects_malformed_bases() {
        assert!(ApiBase::parse(Some("not a url")).is_err());
        assert!(ApiBase::parse(Some("ftp://host/")).is_err());
        assert!(ApiBase::parse(Some("https://host/?debug=1")).is_err());
        assert_eq!(ApiBase::parse(Some("   ")), Ok(ApiBase::SameOrigin));
    }

    #[test]
    fn keeps_base_path_prefix() {
        let base =
            ApiBase::parse(Some("https://edge.example.test/verifier//")).expect("valid base");
        assert_eq!(
            EndpointSet::resolve(&base).stats,
            "https://edge.example.test/verifier/api/stats"
        );
    }

    #[test]
    fn placeholders_ignore_ports_and_unknown_keys() {
        assert_eq!(
            substitute_placeholders("https://host:8080/api/:kind/:id", &[("id", "7")]),
            "https://host:8080/api/:kind/7"
        );
        assert_eq!(substitute_placeholders("/api/:id_x", &[("id", "7")]), "/api/:id_x");
        assert_eq!(substitute_placeholders("/trailing:", &[]), "/trailing:");
    }

    #[test]
    fn path_segment_escapes_target_changing_characters() {
        assert_eq!(path_segment("abc123").as_deref(), Some("abc123"));
        assert_eq!(path_segment("a/b?x").as_deref(), Some("a%2Fb%3Fx"));
        assert_eq!(path_segment("a b+c#").as_deref(), Some("a%20b%2Bc%23"));
        assert_eq!(path_segment("%2e%2e").as_deref(), Some("%252e%252e"));
        for rejected in ["", ".", ".."] {
            assert_eq!(path_segment(rejected), None, "{rejected:?} must be rejected");
        }
    }
}
