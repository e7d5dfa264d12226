//! Payment-confirmation webhook. Verifies the Stripe signature, claims the
//! order atomically, and spawns the processing job. Answers 200 as soon as
//! the event is accepted so Stripe does not retry; processing happens
//! out-of-band on the job set.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::AppState;
use crate::worker;

/// Reject events whose signature timestamp is older than this (replay guard).
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub fn router(_state: AppState) -> Router<AppState> {
    Router::new().route("/stripe/webhook", post(stripe_webhook))
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let sig_header = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| bad_request("missing Stripe-Signature header"))?;

    if !verify_stripe_signature(
        sig_header,
        &state.config.stripe_webhook_secret,
        &body,
        chrono::Utc::now().timestamp(),
    ) {
        tracing::warn!("webhook signature verification failed");
        return Err(bad_request("invalid Stripe signature"));
    }

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("invalid JSON: {e}")))?;

    let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or_default();
    if event_type != "checkout.session.completed" {
        return Ok(Json(json!({ "received": true })));
    }

    let session = event
        .get("data")
        .and_then(|d| d.get("object"))
        .cloned()
        .unwrap_or(Value::Null);

    let payment_ref = session
        .get("payment_intent")
        .and_then(|v| v.as_str())
        .or_else(|| session.get("id").and_then(|v| v.as_str()))
        .ok_or_else(|| bad_request("session missing payment reference"))?
        .to_string();

    let order_id = resolve_order_id(&state, &session).await?;

    let claimed = db::claim_for_processing(&state.db, order_id, &payment_ref)
        .await
        .map_err(internal)?;
    if !claimed {
        // Duplicate delivery or unknown id: never start a second run.
        tracing::info!(%order_id, "webhook delivery did not claim the order, ignoring");
        return Ok(Json(json!({ "received": true })));
    }

    tracing::info!(%order_id, "payment confirmed, processing started");
    let job_state = state.clone();
    state
        .jobs
        .spawn(async move { worker::run_order(job_state, order_id).await });

    Ok(Json(json!({ "received": true })))
}

/// Order id from the session metadata, falling back to the most recent
/// pending order for the session email.
async fn resolve_order_id(
    state: &AppState,
    session: &Value,
) -> Result<Uuid, (StatusCode, Json<Value>)> {
    if let Some(id) = session
        .get("metadata")
        .and_then(|m| m.get("order_id"))
        .and_then(|v| v.as_str())
    {
        return Uuid::parse_str(id).map_err(|_| bad_request("invalid order_id in metadata"));
    }

    let email = session
        .get("metadata")
        .and_then(|m| m.get("email"))
        .and_then(|v| v.as_str())
        .or_else(|| session.get("customer_email").and_then(|v| v.as_str()))
        .ok_or_else(|| bad_request("session carries no order id or email"))?;

    db::latest_pending_order_by_email(&state.db, email)
        .await
        .map_err(internal)?
        .ok_or_else(|| bad_request("no pending order for session email"))
}

/// Stripe signature scheme: `Stripe-Signature: t=<unix>,v1=<hex hmac>` where
/// the HMAC-SHA256 is computed over `"{t}.{raw body}"` with the endpoint
/// secret. Timestamps outside the tolerance window are rejected.
fn verify_stripe_signature(sig_header: &str, secret: &str, body: &[u8], now_unix: i64) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut timestamp = None;
    let mut signature = None;
    for part in sig_header.split(',') {
        let mut kv = part.splitn(2, '=');
        let k = kv.next().unwrap_or("").trim();
        let v = kv.next().unwrap_or("").trim();
        match k {
            "t" => timestamp = Some(v.to_string()),
            "v1" => signature = Some(v.to_string()),
            _ => {}
        }
    }
    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => return false,
    };

    let ts: i64 = match timestamp.parse() {
        Ok(ts) => ts,
        Err(_) => return false,
    };
    if (now_unix - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let payload = format!("{}.{}", timestamp, String::from_utf8_lossy(body));
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload.as_bytes());
    let expected_hex = hex::encode(mac.finalize().into_bytes());
    constant_time_eq_hex(&expected_hex, &signature)
}

fn constant_time_eq_hex(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": msg.into() })),
    )
}

fn internal<E: std::fmt::Display>(err: E) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": err.to_string() })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(body: &[u8], secret: &str, ts: i64) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let payload = format!("{}.{}", ts, String::from_utf8_lossy(body));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        format!("t={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = sign(body, SECRET, now);
        assert!(verify_stripe_signature(&header, SECRET, body, now));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = sign(body, "whsec_other", now);
        assert!(!verify_stripe_signature(&header, SECRET, body, now));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let now = 1_700_000_000;
        let header = sign(b"original", SECRET, now);
        assert!(!verify_stripe_signature(&header, SECRET, b"tampered", now));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let body = b"payload";
        let now = 1_700_000_000;
        let header = sign(body, SECRET, now - 600);
        assert!(!verify_stripe_signature(&header, SECRET, body, now));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(!verify_stripe_signature("", SECRET, b"x", 0));
        assert!(!verify_stripe_signature("t=123", SECRET, b"x", 123));
        assert!(!verify_stripe_signature("v1=deadbeef", SECRET, b"x", 0));
        assert!(!verify_stripe_signature("t=abc,v1=deadbeef", SECRET, b"x", 0));
    }

    #[test]
    fn hex_compare_requires_equal_length() {
        assert!(constant_time_eq_hex("abcd", "abcd"));
        assert!(!constant_time_eq_hex("abcd", "abce"));
        assert!(!constant_time_eq_hex("abcd", "abc"));
    }
}
