//! Integration tests for client settings resolution.

use identity_verifier_app::{AppError, ClientSettings, build_client};
use identity_verifier_endpoints::ConfigError;

#[test]
fn client_settings_tests_absolute_base_resolves_endpoints() {
    let settings =
        ClientSettings::resolve(Some("https://host:8080/"), None).expect("base should resolve");
    let client = build_client(settings).expect("client should build");

    assert_eq!(client.endpoints().verify, "https://host:8080/api/verify");
}

#[test]
fn client_settings_tests_same_origin_keeps_relative_paths() {
    let settings = ClientSettings::resolve(None, Some("http://127.0.0.1:5000"))
        .expect("explicit origin enables same-origin");
    let client = build_client(settings).expect("client should build");

    assert_eq!(client.endpoints().verify, "/api/verify");
    assert_eq!(client.endpoints().stats, "/api/stats");
}

#[test]
fn client_settings_tests_refuse_to_guess_a_host() {
    let error = ClientSettings::resolve(Some("  "), None).expect_err("no configuration");
    assert!(matches!(error, AppError::Config(ConfigError::Missing(_))));
    assert!(error.user_message().contains("IDV_API_BASE_URL"));
}

#[test]
fn client_settings_tests_malformed_base_is_config_error() {
    let error = ClientSettings::resolve(Some("host-without-scheme"), None)
        .expect_err("malformed base");
    assert!(matches!(error, AppError::Config(ConfigError::InvalidBase(_))));
}
