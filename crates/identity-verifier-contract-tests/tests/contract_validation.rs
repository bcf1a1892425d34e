//! Validates contract fixtures and normalizer output against the frozen
//! verification-result schema.

use identity_verifier_contract::{normalize, validate};
use jsonschema::JSONSchema;
use serde_json::{Value, json};

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn result_validator() -> JSONSchema {
    let schema = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/verification-result.schema.json"
    ));
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn valid_fixture_matches_schema_and_validator() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/verification-result.valid.json"
    ));
    assert!(
        result_validator().is_valid(&fixture),
        "valid fixture should validate against schema"
    );

    let result = validate(&fixture).expect("valid fixture should pass validation");
    assert_eq!(result.risk_score, 82);
    assert_eq!(result.explanation.len(), 2);
}

#[test]
fn normalized_partial_fixture_matches_schema() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/verification-result.partial.json"
    ));
    let validator = result_validator();
    assert!(!validator.is_valid(&fixture), "raw partial fixture is off-contract");

    let normalized = normalize(fixture);
    assert!(
        validator.is_valid(&normalized),
        "normalized partial fixture should validate against schema"
    );
    assert_eq!(normalized["explanation"], json!([]));
    assert_eq!(normalized["extractedData"]["idNumber"], "");
}

#[test]
fn serialized_result_matches_schema() {
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/verification-result.valid.json"
    ));
    let result = validate(&fixture).expect("valid fixture should pass validation");
    let serialized = serde_json::to_value(&result).expect("result should serialize");

    assert!(result_validator().is_valid(&serialized));
}

#[test]
fn schema_rejects_missing_risk_score() {
    let payload = json!({
        "riskLevel": "Low Risk",
        "extractedData": {"name": "", "idNumber": "", "dob": ""},
        "explanation": []
    });

    assert!(!result_validator().is_valid(&payload));
    assert!(validate(&normalize(payload)).is_err());
}
