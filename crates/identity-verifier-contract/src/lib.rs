#![warn(missing_docs)]
//! # identity-verifier-contract
//!
//! ## Purpose
//! Defines the verification result contract and the two-stage pipeline that
//! turns an untrusted backend reply into a typed [`VerificationResult`].
//!
//! ## Responsibilities
//! - Repair cosmetic response inconsistencies ([`normalize`]).
//! - Enforce the result shape strictly ([`validate`]).
//! - Derive the display-routing [`RiskTier`] from score and label.
//! - Extract human-readable messages from untrusted error bodies.
//! - Parse read-only history and statistics payloads.
//!
//! ## Data flow
//! Raw response bytes -> JSON value -> [`normalize`] -> [`validate`] ->
//! [`VerificationResult`] -> [`VerificationResult::risk_tier`].
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers. [`normalize`] takes its input by value and hands it back repaired.
//!
//! ## Error model
//! [`normalize`] is total. Invalid JSON returns [`ContractError::Decode`];
//! structurally wrong payloads return [`ContractError::SchemaViolation`].
//!
//! ## Security and privacy notes
//! Extracted document fields are personal data. This crate never logs them;
//! callers must redact before logging raw payloads.
//!
//! ## Example
//! ```rust
//! use identity_verifier_contract::{RiskTier, normalize, validate};
//! use serde_json::json;
//!
//! let raw = json!({"riskScore": 12, "riskLevel": "LOW"});
//! let result = validate(&normalize(raw)).unwrap();
//! assert_eq!(result.extracted_data.name, "");
//! assert!(result.explanation.is_empty());
//! assert_eq!(result.risk_tier(), RiskTier::Low);
//! ```

mod records;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use records::{VerificationRecord, VerificationStats, parse_records, parse_stats};

/// Lowest score treated as high risk regardless of label.
pub const HIGH_RISK_SCORE_THRESHOLD: u8 = 75;

/// Highest score treated as low risk when nothing signals high risk.
pub const LOW_RISK_SCORE_THRESHOLD: u8 = 30;

/// Upper bound of the risk score range.
pub const MAX_RISK_SCORE: u8 = 100;

/// Extracted-data keys that are always present as strings after repair.
pub const EXTRACTED_FIELDS: [&str; 3] = ["name", "idNumber", "dob"];

/// Validated verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Risk magnitude in [0, 100].
    pub risk_score: u8,
    /// Backend risk label, compared case-insensitively.
    pub risk_level: String,
    /// Fields read from the document; empty string means unreadable.
    pub extracted_data: ExtractedData,
    /// Analysis findings in display order.
    pub explanation: Vec<String>,
}

/// Document fields extracted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    /// Holder name.
    pub name: String,
    /// Document number.
    pub id_number: String,
    /// Date of birth as printed.
    pub dob: String,
}

/// Display-routing risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Calm result.
    Low,
    /// Neither high nor low signals fired.
    Medium,
    /// Alarming result.
    High,
}

impl RiskTier {
    /// Classifies a score/label pair.
    ///
    /// Precedence matters because score and label can disagree:
    /// - `High` when `score >= 75` OR the label is `"high"`. Either alarming
    ///   signal is enough, so `(10, "high")` and `(80, "low")` are both high.
    /// - Otherwise `Low` when `score <= 30` OR the label is `"low"`.
    /// - Otherwise `Medium`.
    ///
    /// Labels are trimmed and compared case-insensitively.
    pub fn classify(score: u8, level: &str) -> Self {
        let level = level.trim();
        if score >= HIGH_RISK_SCORE_THRESHOLD || level.eq_ignore_ascii_case("high") {
            return Self::High;
        }
        if score <= LOW_RISK_SCORE_THRESHOLD || level.eq_ignore_ascii_case("low") {
            return Self::Low;
        }
        Self::Medium
    }

    /// Returns a lowercase tag for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl VerificationResult {
    /// Derives the display-routing tier. See [`RiskTier::classify`].
    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::classify(self.risk_score, &self.risk_level)
    }
}

/// Repairs a loosely-typed backend reply before validation.
///
/// Never fails. Non-object input is returned unchanged so [`validate`] can
/// reject it. For objects:
/// - `explanation` that is not an array becomes `[]`; inside an array, strings
///   are kept, numbers and booleans are stringified, anything else is dropped.
/// - `extractedData` that is missing or not an object becomes an object of
///   empty strings; otherwise each of `name`, `idNumber`, `dob` that is missing
///   or not a string becomes `""` on its own.
/// - All other fields pass through untouched.
pub fn normalize(raw: Value) -> Value {
    let Value::Object(mut object) = raw else {
        return raw;
    };

    let explanation = match object.remove("explanation") {
        Some(Value::Array(items)) => items.into_iter().filter_map(explanation_entry).collect(),
        _ => Vec::new(),
    };
    object.insert("explanation".to_string(), Value::Array(explanation));

    let mut extracted = match object.remove("extractedData") {
        Some(Value::Object(fields)) => fields,
        _ => Map::new(),
    };
    for key in EXTRACTED_FIELDS {
        if !matches!(extracted.get(key), Some(Value::String(_))) {
            extracted.insert(key.to_string(), Value::String(String::new()));
        }
    }
    object.insert("extractedData".to_string(), Value::Object(extracted));

    Value::Object(object)
}

fn explanation_entry(item: Value) -> Option<Value> {
    match item {
        Value::String(_) => Some(item),
        Value::Number(number) => Some(Value::String(number.to_string())),
        Value::Bool(flag) => Some(Value::String(flag.to_string())),
        _ => None,
    }
}

/// Strictly validates a (normalized) payload.
///
/// `explanation` is not defaulted here: a payload that skipped [`normalize`]
/// and lacks it is rejected.
///
/// # Errors
/// Returns [`ContractError::SchemaViolation`] when a required field is absent
/// or has a type that cannot be coerced.
pub fn validate(payload: &Value) -> Result<VerificationResult, ContractError> {
    let object = payload
        .as_object()
        .ok_or_else(|| violation("payload is not an object"))?;

    let risk_score = risk_score(object.get("riskScore"))?;

    let risk_level = match object.get("riskLevel") {
        Some(Value::String(level)) => level.clone(),
        Some(_) => return Err(violation("riskLevel is not a string")),
        None => return Err(violation("riskLevel is missing")),
    };

    let extracted = match object.get("extractedData") {
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err(violation("extractedData is not an object")),
        None => return Err(violation("extractedData is missing")),
    };
    let extracted_data = ExtractedData {
        name: extracted_field(extracted, "name")?,
        id_number: extracted_field(extracted, "idNumber")?,
        dob: extracted_field(extracted, "dob")?,
    };

    let explanation = match object.get("explanation") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| violation(format!("explanation[{index}] is not a string")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(violation("explanation is not an array")),
        None => return Err(violation("explanation is missing")),
    };

    Ok(VerificationResult {
        risk_score,
        risk_level,
        extracted_data,
        explanation,
    })
}

fn risk_score(value: Option<&Value>) -> Result<u8, ContractError> {
    let raw = match value {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| violation("riskScore is not representable"))?,
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| violation(format!("riskScore {text:?} is not numeric")))?,
        Some(_) => return Err(violation("riskScore is not a number")),
        None => return Err(violation("riskScore is missing")),
    };

    let rounded = raw.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(MAX_RISK_SCORE) {
        return Err(violation(format!(
            "riskScore {raw} is outside 0..={MAX_RISK_SCORE}"
        )));
    }

    Ok(rounded as u8)
}

fn extracted_field(fields: &Map<String, Value>, key: &str) -> Result<String, ContractError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(_) => Err(violation(format!("extractedData.{key} is not a scalar"))),
    }
}

fn violation(detail: impl Into<String>) -> ContractError {
    ContractError::SchemaViolation(detail.into())
}

/// Decodes, normalizes and validates one verification response body.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the body is not JSON and
/// [`ContractError::SchemaViolation`] when the repaired value is still invalid.
pub fn parse_verification_response(raw: &[u8]) -> Result<VerificationResult, ContractError> {
    let value: Value = serde_json::from_slice(raw)?;
    validate(&normalize(value))
}

/// Error body sent by the backend on non-success responses.
///
/// Every field is optional because the body is untrusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Primary human-readable message.
    pub message: Option<String>,
    /// Offending request field for validation failures.
    pub field: Option<String>,
    /// Findings list, sometimes used instead of `message`.
    pub explanation: Vec<String>,
}

impl ErrorPayload {
    /// Parses an error body, ignoring fields with unexpected types.
    ///
    /// Returns `None` when the body is not a JSON object.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let object = value.as_object()?;

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        let explanation = match object.get("explanation") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            message: text("message"),
            field: text("field"),
            explanation,
        })
    }

    /// Returns the best human-readable message, if any.
    ///
    /// A non-blank `message` wins; otherwise the first non-blank explanation
    /// entry is used.
    pub fn best_message(&self) -> Option<String> {
        self.message
            .iter()
            .chain(self.explanation.iter())
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Contract parse/validation errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Body is not valid JSON.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Payload is structurally invalid even after normalization.
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}
