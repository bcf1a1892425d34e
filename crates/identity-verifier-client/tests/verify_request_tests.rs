//! Integration tests for the verify request and success path.

mod common;

use identity_verifier_client::{ApiRequest, DOCUMENT_FIELD, VerificationError};
use identity_verifier_contract::RiskTier;

#[tokio::test]
async fn verify_request_tests_posts_single_file_field_to_verify_endpoint() {
    let transport = common::ScriptedTransport::new(vec![common::reply(
        200,
        "OK",
        r#"{"riskScore":12,"riskLevel":"low","extractedData":{"name":"Jane Roe","idNumber":"X1","dob":"1990-01-01"},"explanation":["MRZ checksum valid"]}"#,
    )]);
    let client = common::client_with(transport.clone());

    let result = client
        .verify(common::fixture_document())
        .await
        .expect("verification should succeed");
    assert_eq!(result.risk_score, 12);
    assert_eq!(result.extracted_data.name, "Jane Roe");
    assert_eq!(result.risk_tier(), RiskTier::Low);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        ApiRequest::Multipart {
            url,
            field,
            document,
        } => {
            assert_eq!(url, "https://verifier.example.test:8080/api/verify");
            assert_eq!(field, DOCUMENT_FIELD);
            assert_eq!(document.content_type, "image/jpeg");
        }
        other => panic!("expected multipart request, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_request_tests_repairs_cosmetic_gaps_on_success() {
    let transport = common::ScriptedTransport::new(vec![common::reply(
        200,
        "OK",
        r#"{"riskScore":"64","riskLevel":"Medium","extractedData":{"name":null}}"#,
    )]);
    let client = common::client_with(transport);

    let result = client
        .verify(common::fixture_document())
        .await
        .expect("cosmetic gaps should be repaired");
    assert_eq!(result.risk_score, 64);
    assert_eq!(result.extracted_data.id_number, "");
    assert!(result.explanation.is_empty());
}

#[tokio::test]
async fn verify_request_tests_unparsable_success_body_is_decode_error() {
    let transport =
        common::ScriptedTransport::new(vec![common::reply(200, "OK", "<html>ok</html>")]);
    let client = common::client_with(transport);

    let error = client
        .verify(common::fixture_document())
        .await
        .expect_err("200 with non-JSON must fail");
    assert!(matches!(error, VerificationError::Decode(_)));
}

#[tokio::test]
async fn verify_request_tests_schema_violation_is_distinct_from_http_errors() {
    let transport = common::ScriptedTransport::new(vec![common::reply(
        200,
        "OK",
        r#"{"riskLevel":"low","explanation":[]}"#,
    )]);
    let client = common::client_with(transport);

    let error = client
        .verify(common::fixture_document())
        .await
        .expect_err("missing score must fail");
    assert!(matches!(error, VerificationError::SchemaViolation(_)));
    assert_eq!(error.status(), None);
    assert!(error.user_message().starts_with("Verification failed"));
}
