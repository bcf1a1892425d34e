//! Read-only history and statistics payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContractError, VerificationResult, normalize, validate};

/// One historical verification as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Backend record identifier.
    pub id: String,
    /// Original upload file name.
    pub file_name: String,
    /// Creation time as sent by the backend (RFC 3339 text or epoch digits).
    pub created_at: String,
    /// Result fields, repaired and validated like a verify response.
    #[serde(flatten)]
    pub result: VerificationResult,
}

impl VerificationRecord {
    /// Builds a record from one untrusted JSON value.
    ///
    /// # Errors
    /// Returns [`ContractError::SchemaViolation`] when the embedded result is
    /// invalid after normalization or the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        let object = value
            .as_object()
            .ok_or_else(|| ContractError::SchemaViolation("record is not an object".to_string()))?;

        let id = scalar_text(object.get("id"));
        let file_name = scalar_text(object.get("fileName"));
        let created_at = scalar_text(object.get("createdAt"));
        let result = validate(&normalize(value))?;

        Ok(Self {
            id,
            file_name,
            created_at,
            result,
        })
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

/// Parses a `GET /api/verifications` body.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON, and
/// [`ContractError::SchemaViolation`] when the body is not an array or any
/// record is invalid.
pub fn parse_records(raw: &[u8]) -> Result<Vec<VerificationRecord>, ContractError> {
    let value: Value = serde_json::from_slice(raw)?;
    let Value::Array(items) = value else {
        return Err(ContractError::SchemaViolation(
            "verification list is not an array".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            VerificationRecord::from_value(item).map_err(|error| match error {
                ContractError::SchemaViolation(detail) => {
                    ContractError::SchemaViolation(format!("record {index}: {detail}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Aggregate counters from `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationStats {
    /// All verifications considered.
    pub total_verifications: u64,
    /// Verifications labelled low risk.
    pub low_risk_count: u64,
    /// Verifications labelled medium risk.
    pub medium_risk_count: u64,
    /// Verifications labelled high risk.
    pub high_risk_count: u64,
    /// Mean score, rounded by the backend.
    pub average_risk_score: f64,
}

impl VerificationStats {
    /// Share of low-risk verifications in percent, rounded.
    pub fn clear_rate_percent(&self) -> u64 {
        let total = u128::from(self.total_verifications.max(1));
        let rate = (u128::from(self.low_risk_count) * 100 + total / 2) / total;
        u64::try_from(rate).unwrap_or(u64::MAX)
    }
}

/// Parses a `GET /api/stats` body; absent counters default to zero.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the body is not a JSON object with
/// numeric counters.
pub fn parse_stats(raw: &[u8]) -> Result<VerificationStats, ContractError> {
    Ok(serde_json::from_slice(raw)?)
}
