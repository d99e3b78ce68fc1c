//! Service-account token exchange against a mock token endpoint.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheets_client::{ServiceAccountKey, ServiceAccountTokenProvider, SheetsError, TokenProvider};

const TEST_KEY_PEM: &str = include_str!("fixtures/test_service_account_key.pem");

fn provider(server: &MockServer) -> ServiceAccountTokenProvider {
    ServiceAccountTokenProvider::new(ServiceAccountKey {
        client_email: "reconciler@test-project.iam.gserviceaccount.com".into(),
        private_key: TEST_KEY_PEM.into(),
        private_key_id: Some("test-key-id".into()),
        token_uri: format!("{}/token", server.uri()),
    })
    .unwrap()
}

#[tokio::test]
async fn token_is_cached_until_near_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.first",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    assert_eq!(provider.valid_token().await.unwrap(), "ya29.first");
    assert_eq!(provider.valid_token().await.unwrap(), "ya29.first");
}

#[tokio::test]
async fn short_lived_token_is_refreshed_on_next_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.short",
            "expires_in": 30,
            "token_type": "Bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    provider.valid_token().await.unwrap();
    provider.valid_token().await.unwrap();
}

#[tokio::test]
async fn rejected_assertion_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let err = provider(&server).valid_token().await.unwrap_err();
    assert!(matches!(err, SheetsError::Auth(ref m) if m.contains("invalid_grant")));
}
