//! Storage API: presigned uploads and proxied multipart uploads against a
//! mocked S3-compatible endpoint.

mod test_utils;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use test_utils::*;
use wiremock::matchers::{header, header_exists, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "X-APPLIED-AI-BOUNDARY";

fn upload_request(token: Option<&str>, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/storage/upload/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

fn presign_request(token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/storage/presign/")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn presign_requires_upload_token() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream("http://127.0.0.1:9000"), db).unwrap();

    let (status, _) = send(
        &app,
        json_request("POST", "/api/storage/presign/", &json!({"key": "a.png"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, presign_request(ADMIN_TOKEN, json!({"key": "a.png"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn presign_validates_key() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream("http://127.0.0.1:9000"), db).unwrap();

    let (status, body) = send(&app, presign_request(UPLOAD_TOKEN, json!({"key": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing key");

    for key in ["/etc/passwd", "images/../secret", "./a.png"] {
        let (status, _) = send(&app, presign_request(UPLOAD_TOKEN, json!({"key": key}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "key {key} must be rejected");
    }
}

#[tokio::test]
async fn presign_returns_path_style_url() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream("http://127.0.0.1:9000"), db).unwrap();

    let (status, body) = send(
        &app,
        presign_request(
            UPLOAD_TOKEN,
            json!({"key": "images/header.png", "contentType": "image/png"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://127.0.0.1:9000/assets/images/header.png?"));
    assert!(url.contains("X-Amz-Signature="));
    assert_eq!(body["headers"]["Content-Type"], "image/png");
    assert_eq!(body["bucket"], "assets");
    assert_eq!(body["key"], "images/header.png");
    assert!(body["publicUrl"].is_null());

    let (_, body) = send(
        &app,
        presign_request(UPLOAD_TOKEN, json!({"key": "a.bin", "acl": "public-read"})),
    )
    .await;
    assert_eq!(body["headers"]["Content-Type"], "application/octet-stream");
    assert!(body["url"].as_str().unwrap().contains("x-amz-acl=public-read"));
    assert!(body["publicUrl"].as_str().unwrap().ends_with("/a.bin"));
}

#[tokio::test]
async fn presign_without_storage_credentials_is_server_error() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(test_config(), db).unwrap();

    let (status, body) = send(&app, presign_request(UPLOAD_TOKEN, json!({"key": "a.png"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "NOT_CONFIGURED");
}

#[tokio::test]
async fn upload_puts_public_object_with_sanitised_key() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/assets/uploads/\d+-my_photo.png$"))
        .and(header("x-amz-acl", "public-read"))
        .and(header("content-type", "image/png"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(
        &app,
        upload_request(Some(UPLOAD_TOKEN), "file", "my photo.png", b"\x89PNG data"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["bucket"], "assets");
    assert_eq!(body["size"], 9);
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("uploads/"));
    assert!(key.ends_with("-my_photo.png"));
    assert!(body["url"].as_str().unwrap().ends_with(key));
}

#[tokio::test]
async fn upload_rejects_missing_file_and_bad_token() {
    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream("http://127.0.0.1:9000"), db).unwrap();

    let (status, _) = send(&app, upload_request(None, "file", "a.png", b"data")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        upload_request(Some(UPLOAD_TOKEN), "attachment", "a.png", b"data"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file provided");

    let (status, body) = send(&app, upload_request(Some(UPLOAD_TOKEN), "file", "a.png", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Uploaded file is empty");
}

#[tokio::test]
async fn upload_failure_does_not_leak_storage_response() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<Error>SignatureDoesNotMatch</Error>"))
        .mount(&server)
        .await;

    let db = setup_test_db().await.unwrap();
    let app = test_app(config_with_upstream(&server.uri()), db).unwrap();

    let (status, body) = send(&app, upload_request(Some(UPLOAD_TOKEN), "file", "a.png", b"data")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("SignatureDoesNotMatch"));
}
