//! End-to-end smoke test over a real TCP listener.
//!
//! Serves the full router on an ephemeral port and exercises the public
//! surface with an HTTP client, the way the site frontend talks to it.

mod test_utils;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use test_utils::*;

async fn spawn_server() -> SocketAddr {
    let db = setup_test_db().await.expect("database migrates");
    let app = test_app(test_config(), db).expect("app builds");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port binds");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("[smoke] server stopped: {err}");
        }
    });
    addr
}

#[tokio::test]
async fn smoke_public_surface_over_http() {
    let addr = spawn_server().await;
    let base = format!("http://{}", addr);
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let root: Value = client
        .get(format!("{}/", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["service"], "applied-ai-api");

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let openapi: Value = client
        .get(format!("{}/openapi.json", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(openapi["paths"]["/api/news/feed/"].is_object());
    assert!(openapi["components"]["securitySchemes"]["bearer_auth"].is_object());

    let tools = client
        .get(format!("{}/api/tools/", base))
        .send()
        .await
        .unwrap();
    assert_eq!(tools.status(), StatusCode::OK);
    let tools: Value = tools.json().await.unwrap();
    assert_eq!(tools["count"], 0);

    let admin = client
        .get(format!("{}/api/admin/landing-pages/", base))
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::UNAUTHORIZED);
    assert!(admin.headers().contains_key("x-trace-id"));

    let admin = client
        .get(format!("{}/api/admin/landing-pages/", base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status(), StatusCode::OK);
}
