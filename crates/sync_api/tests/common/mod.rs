//! Shared scaffolding for API integration tests: the app wired to an
//! in-memory database and a httpmock server standing in for Stripe, the
//! sync workflow, and Resend.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use sha2::Sha256;
use tempfile::TempDir;
use tower::ServiceExt;

use sync_api::config::Config;
use sync_api::state::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";
pub const BOUNDARY: &str = "sdtestboundary";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub server: MockServer,
    // Keeps the upload dir alive for the test duration.
    _upload_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let server = MockServer::start();
    let upload_dir = TempDir::new().expect("tempdir");

    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        public_base_url: "http://localhost:8080".to_string(),
        upload_dir: PathBuf::from(upload_dir.path()),
        stripe_secret_key: "sk_test_xxx".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        stripe_api_base: server.base_url(),
        sync_workflow_url: format!("{}/workflow", server.base_url()),
        sync_api_key: "wf_test_key".to_string(),
        resend_api_key: "re_test_key".to_string(),
        resend_api_base: server.base_url(),
        mail_from: "SyncDrop <noreply@syncdrop.app>".to_string(),
    };

    let pool = db::connect_memory().await.expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");

    let state = AppState::new(pool, Arc::new(config));
    let app = sync_api::app(state.clone());

    TestApp {
        app,
        state,
        server,
        _upload_dir: upload_dir,
    }
}

pub fn mock_stripe_checkout(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/v1/checkout/sessions");
        then.status(200).json_body(serde_json::json!({
            "id": "cs_test_123",
            "url": "https://checkout.stripe.test/c/pay/cs_test_123",
        }));
    })
}

pub fn mock_workflow_success(server: &MockServer, video: bool) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/workflow");
        then.status(200).json_body(serde_json::json!({
            "status": "success",
            "outputs": {
                "lrc_url": "https://files.example.com/song.lrc",
                "srt_url": "https://files.example.com/song.srt",
                "lrc_content": "[00:01.00]line one",
                "srt_content": "1\n00:00:01,000 --> 00:00:02,000\nline one",
                "video_url": if video {
                    serde_json::Value::from("https://files.example.com/karaoke.mp4")
                } else {
                    serde_json::Value::Null
                },
            },
        }));
    })
}

pub fn mock_workflow_error(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/workflow");
        then.status(200).json_body(serde_json::json!({
            "status": "error",
            "error": "alignment failed: audio too noisy",
        }));
    })
}

pub fn mock_resend(server: &MockServer, status: u16) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(status)
            .json_body(serde_json::json!({ "id": "email_test_123" }));
    })
}

/// Build a multipart/form-data body with the given text fields and an
/// optional audio file part.
pub fn multipart_body(fields: &[(&str, &str)], audio: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = audio {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"{file_name}\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn get(uri: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .uri(uri.as_ref())
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.clone().oneshot(req).await.expect("request");
    let status = res.status();
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Sign a webhook payload the way Stripe does: HMAC-SHA256 over
/// `"{timestamp}.{body}"` with the endpoint secret.
pub fn sign_event(body: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let ts = chrono::Utc::now().timestamp();
    let payload = format!("{ts}.{body}");
    let mut mac = HmacSha256::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn checkout_completed_event(order_id: Option<&str>, email: &str, tier: &str) -> String {
    let mut metadata = serde_json::json!({ "email": email, "tier": tier });
    if let Some(id) = order_id {
        metadata["order_id"] = serde_json::Value::from(id);
    }
    serde_json::json!({
        "id": "evt_test_1",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_test_123",
            "payment_intent": "pi_test_123",
            "customer_email": email,
            "metadata": metadata,
        }},
    })
    .to_string()
}

pub async fn post_webhook(app: &Router, body: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/stripe/webhook")
        .header("Stripe-Signature", sign_event(body))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

/// Run the full checkout form flow and return the new order id.
pub async fn checkout_order(app: &TestApp, email: &str, tier: &str, audio: &[u8]) -> String {
    let _stripe = mock_stripe_checkout(&app.server);
    let body = multipart_body(
        &[
            ("email", email),
            ("confirm_email", email),
            ("tier", tier),
            ("lyrics", "line one\nline two"),
        ],
        Some(("song.wav", audio)),
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/checkout")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, json) = send(&app.app, req).await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {json}");
    assert_eq!(json["url"], "https://checkout.stripe.test/c/pay/cs_test_123");
    json["order_id"].as_str().expect("order_id").to_string()
}
