//! ApiClient against a mock HTTP server.

use std::time::Duration;

use asfalis_core::api::{ApiClient, ApiError, AuthApi, ClientOptions};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> ApiClient {
    let options = ClientOptions::new(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(&options).unwrap()
}

// -------------------------------------------------------------------------
// login
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/personal"))
        .and(body_json(json!({"Name": "bob", "Password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": 12,
            "username": "bob",
            "email": "bob@example.com",
            "token": "jwt-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client_for(&server).await.login("bob", "secret").await.unwrap();

    assert_eq!(grant.user_id, 12);
    assert_eq!(grant.username, "bob");
    assert_eq!(grant.email, "bob@example.com");
    assert_eq!(grant.token, "jwt-1");
}

#[tokio::test]
async fn test_login_rejected_carries_plain_text_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/personal"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.login("bob", "wrong").await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("invalid credentials".into()));
}

#[tokio::test]
async fn test_login_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/personal"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.login("bob", "secret").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::ServerError {
            status: 500,
            message: "database offline".into()
        }
    );
}

#[tokio::test]
async fn test_login_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/personal"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome!"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.login("bob", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::ServerError { status: 200, .. }));
}

#[tokio::test]
async fn test_login_grant_without_token_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": 1, "username": "bob", "email": "", "token": ""
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).await.login("bob", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::ServerError { status: 200, .. }));
}

// -------------------------------------------------------------------------
// validate_token
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_validate_token_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/token/validation"))
        .and(body_json(json!({"token": "abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "xyz"})))
        .expect(1)
        .mount(&server)
        .await;

    let validation = client_for(&server).await.validate_token("abc").await.unwrap();
    assert_eq!(validation.refreshed_token.as_deref(), Some("xyz"));
}

#[tokio::test]
async fn test_validate_token_empty_body_is_valid_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/token/validation"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let validation = client_for(&server).await.validate_token("abc").await.unwrap();
    assert_eq!(validation.refreshed_token, None);
}

#[tokio::test]
async fn test_validate_token_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/token/validation"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Token is not valid"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.validate_token("abc").await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("Token is not valid".into()));
}

// -------------------------------------------------------------------------
// resolve_code
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_resolve_code_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/login/qrcode/12/CIPHER123"))
        .and(header("Authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Door 4 unlocked"))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server)
        .await
        .resolve_code(12, "CIPHER123", "jwt-1")
        .await
        .unwrap();
    assert_eq!(payload, "Door 4 unlocked");
}

#[tokio::test]
async fn test_resolve_code_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/login/qrcode/12/CIPHER123"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .resolve_code(12, "CIPHER123", "jwt-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

// -------------------------------------------------------------------------
// transport
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_slow_server_times_out_as_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login/token/validation"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let options = ClientOptions {
        connect_timeout: Duration::from_millis(500),
        read_timeout: Duration::from_millis(200),
        write_timeout: Duration::from_millis(100),
        ..ClientOptions::new(&format!("{}/api/", server.uri())).unwrap()
    };
    let client = ApiClient::new(&options).unwrap();

    let err = client.validate_token("abc").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkFailure(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    let options = ClientOptions {
        connect_timeout: Duration::from_millis(500),
        ..ClientOptions::new("http://127.0.0.1:1/api/").unwrap()
    };
    let client = ApiClient::new(&options).unwrap();

    let err = client.login("bob", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkFailure(_)));
}
