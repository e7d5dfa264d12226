//! Checkout initiation: validate the upload form, store the audio file,
//! insert a pending order, and create the Stripe Checkout session.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::state::AppState;
use db::NewOrder;
use domain::{CheckoutResponse, Tier};

/// Hard cap on uploaded audio size.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg", "aac"];

pub fn router(_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES + 64 * 1024))
}

async fn create_checkout(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CheckoutResponse>, (StatusCode, Json<Value>)> {
    let mut email: Option<String> = None;
    let mut confirm_email: Option<String> = None;
    let mut tier: Option<String> = None;
    let mut lyrics: Option<String> = None;
    let mut audio: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "email" => email = Some(field.text().await.map_err(field_err)?),
            "confirm_email" => confirm_email = Some(field.text().await.map_err(field_err)?),
            "tier" => tier = Some(field.text().await.map_err(field_err)?),
            "lyrics" => lyrics = Some(field.text().await.map_err(field_err)?),
            "audio" => {
                let file_name = field.file_name().unwrap_or("audio").to_string();
                let data = field.bytes().await.map_err(field_err)?;
                audio = Some((file_name, data));
            }
            _ => {}
        }
    }

    let email = email
        .filter(|e| e.contains('@') && !e.trim().is_empty())
        .ok_or_else(|| bad_request("a valid email is required"))?;
    let confirm_email =
        confirm_email.ok_or_else(|| bad_request("confirm_email is required"))?;
    if confirm_email != email {
        return Err(bad_request("email addresses do not match"));
    }
    let tier = tier
        .as_deref()
        .and_then(Tier::parse)
        .ok_or_else(|| bad_request("tier must be standard or pro"))?;
    let lyrics = lyrics
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| bad_request("lyrics are required"))?;
    let (file_name, data) = audio.ok_or_else(|| bad_request("an audio file is required"))?;
    if data.is_empty() {
        return Err(bad_request("audio file is empty"));
    }
    if data.len() > MAX_AUDIO_BYTES {
        return Err(bad_request("audio file exceeds the 25 MB limit"));
    }
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(bad_request(
            "unsupported audio format (wav, mp3, m4a, flac, ogg, aac)",
        ));
    }

    // Store the upload under a fresh name and build the public URL the sync
    // workflow will fetch it from.
    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(internal)?;
    let stored_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let path = state.config.upload_dir.join(&stored_name);
    tokio::fs::write(&path, &data).await.map_err(internal)?;
    let audio_url = format!("{}/uploads/{}", state.config.public_base_url, stored_name);

    let order_id = db::insert_order(
        &state.db,
        NewOrder {
            email: &email,
            tier,
            audio_url: &audio_url,
            lyrics: &lyrics,
        },
    )
    .await
    .map_err(internal)?;

    let url = state
        .stripe
        .create_checkout_session(order_id, &email, tier, &state.config.public_base_url)
        .await
        .map_err(|e| {
            tracing::error!(%order_id, "checkout session creation failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": format!("Stripe checkout failed: {e}") })),
            )
        })?;

    tracing::info!(%order_id, tier = tier.as_str(), "checkout session created");
    Ok(Json(CheckoutResponse { url, order_id }))
}

fn field_err(err: axum::extract::multipart::MultipartError) -> (StatusCode, Json<Value>) {
    bad_request(format!("invalid form data: {err}"))
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
