//! Integration tests for log redaction.

use identity_verifier_app::redact_sensitive;

#[test]
fn log_redaction_tests_removes_bearer_tokens() {
    let redacted = redact_sensitive("request to /api/verify failed authorization=Bearer abc123");

    assert!(redacted.starts_with("request to /api/verify failed "));
    assert!(redacted.contains("<redacted>"));
    assert!(!redacted.contains("abc123"));
}

#[test]
fn log_redaction_tests_hide_document_identifiers() {
    for raw in [
        r#"{"extractedData":{"idNumber":"P1234567"}}"#,
        "password=supersecret",
        "DOB: 1990-01-01",
    ] {
        let redacted = redact_sensitive(raw);
        assert!(redacted.contains("<redacted>"), "{raw} should be redacted");
        assert!(!redacted.contains("P1234567"));
        assert!(!redacted.contains("supersecret"));
        assert!(!redacted.contains("1990-01-01"));
    }
}

#[test]
fn log_redaction_tests_ignore_keys_inside_ordinary_words() {
    for harmless in [
        "uploaded adobe_scan.jpg (2 pages)",
        "refreshed 3 tokens for the session pool",
        "passwordless login is disabled",
    ] {
        assert_eq!(redact_sensitive(harmless), harmless);
    }
}

#[test]
fn log_redaction_tests_catch_separated_keys() {
    let redacted = redact_sensitive("file=adobe_scan.jpg access_token=abc123");

    assert_eq!(redacted, "file=adobe_scan.jpg access_token=<redacted>");
}
