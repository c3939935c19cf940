//! HTTP-level tests of the client against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secure_api_client::api::transport::ReqwestTransport;
use secure_api_client::api::types::{FormPart, LoginRequest};
use secure_api_client::{ApiClient, ApiResult, ClientConfig, Credential, CredentialStore, FieldCipher, RequestOptions, SensitiveFieldSet};

const SECRET: &str = "integration-secret";

async fn client(config: ClientConfig, token: Option<&str>) -> ApiClient<ReqwestTransport> {
    let transport = ReqwestTransport::new(&config).unwrap();
    let store = Arc::new(CredentialStore::in_memory());
    if let Some(token) = token {
        store.set(Credential::new(token)).await;
    }
    ApiClient::with_transport(&config, transport, store).unwrap()
}

#[tokio::test]
async fn get_sends_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "data": [{"id": 1}],
            "meta": {"total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(ClientConfig::new(&server.uri()), Some("tok")).await;
    let result: ApiResult<Vec<Value>> = client
        .get("/projects", RequestOptions::default().param("page", "2"))
        .await;

    assert!(result.success);
    assert_eq!(result.message, "ok");
    assert_eq!(result.data, Some(vec![json!({"id": 1})]));
    assert_eq!(result.meta["total"], 1);
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 5}})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "new"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(ClientConfig::new(&server.uri()), Some("old")).await;
    let result: ApiResult<Value> = client
        .post("/projects", &json!({"name": "Roadmap"}), RequestOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.status_code, 201);
    assert_eq!(result.data, Some(json!({"id": 5})));
    assert_eq!(client.credentials().get().await, Some(Credential::new("new")));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn failed_refresh_returns_original_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired", "statusCode": 401})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "refresh token revoked"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(ClientConfig::new(&server.uri()), Some("old")).await;
    let result: ApiResult<Value> = client.get("/me", RequestOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.status_code, 401);
    assert_eq!(result.message, "jwt expired");
    assert_eq!(client.credentials().get().await, Some(Credential::new("old")));
}

#[tokio::test]
async fn login_encrypts_password_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Welcome back",
            "data": {"accessToken": "issued"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri()).with_encryption(SECRET);
    let client = client(config, None).await;
    let result = client
        .login(&LoginRequest {
            email: "a@b.com".into(),
            password: "secret123".into(),
        })
        .await;
    assert!(result.success);
    assert_eq!(client.credentials().get().await, Some(Credential::new("issued")));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["email"], "a@b.com");
    assert_ne!(body["password"], "secret123");

    let cipher = FieldCipher::new(SECRET, SensitiveFieldSet::default()).unwrap();
    let restored = cipher.decrypt_fields(body.as_object().unwrap()).unwrap();
    assert_eq!(restored["password"], "secret123");
}

#[tokio::test]
async fn multipart_upload_is_sent_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "stored"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri()).with_encryption(SECRET);
    let client = client(config, None).await;
    let parts = vec![
        FormPart::Text {
            name: "password".into(),
            value: "secret123".into(),
        },
        FormPart::File {
            name: "file".into(),
            filename: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: b"hello".to_vec(),
        },
    ];
    let result: ApiResult<String> = client.post_multipart("/upload", parts, RequestOptions::default()).await;
    assert_eq!(result.data.as_deref(), Some("stored"));

    let requests = server.received_requests().await.unwrap();
    let raw = String::from_utf8_lossy(&requests[0].body);
    assert!(raw.contains("secret123"));
    assert!(raw.contains("hello"));
}

#[tokio::test]
async fn structured_error_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "Project not found",
            "meta": {"id": 9}
        })))
        .mount(&server)
        .await;

    let client = client(ClientConfig::new(&server.uri()), None).await;
    let result: ApiResult<Value> = client.delete("/projects/9", RequestOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.message, "Project not found");
    assert_eq!(result.status_code, 404);
    assert_eq!(result.meta["id"], 9);
    assert!(result.data.is_none());
}

#[tokio::test]
async fn timeout_surfaces_as_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client(ClientConfig::new(&server.uri()), None).await;
    let result: ApiResult<Value> = client
        .get("/slow", RequestOptions::default().timeout(Duration::from_millis(100)))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 500);
    assert!(result.data.is_none());
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn unreachable_server_surfaces_as_500() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");

    let client = client(ClientConfig::new(&uri), None).await;
    let result: ApiResult<Value> = client.get("/anything", RequestOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.status_code, 500);
    assert!(result.data.is_none());
}
