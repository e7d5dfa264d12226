//! Order status polling. Clients poll here after checkout until the order
//! reaches a terminal state.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::AppState;
use db::OrderRow;
use domain::{OrderStatus, OutputUrls, StatusResponse};

pub fn router(_state: AppState) -> Router<AppState> {
    Router::new().route("/status", get(order_status))
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    order_id: Option<Uuid>,
    email: Option<String>,
}

async fn order_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<Value>)> {
    if let Some(order_id) = params.order_id {
        let row = db::get_order(&state.db, order_id)
            .await
            .map_err(internal)?
            .ok_or((
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "order not found" })),
            ))?;
        return Ok(Json(response_for(&row)));
    }

    let email = params.email.ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "order_id or email parameter is required" })),
    ))?;

    match db::latest_order_by_email(&state.db, &email)
        .await
        .map_err(internal)?
    {
        Some(row) => Ok(Json(response_for(&row))),
        // No row yet: the webhook may not have landed. Report pending so the
        // client keeps polling.
        None => Ok(Json(StatusResponse {
            status: OrderStatus::Pending,
            urls: None,
            error: None,
        })),
    }
}

fn response_for(row: &OrderRow) -> StatusResponse {
    let status = row.status().unwrap_or(OrderStatus::Pending);
    StatusResponse {
        status,
        urls: (status == OrderStatus::Done).then(|| OutputUrls {
            lrc_url: row.lrc_url.clone(),
            srt_url: row.srt_url.clone(),
            video_url: row.video_url.clone(),
        }),
        error: (status == OrderStatus::Failed)
            .then(|| row.error_message.clone().unwrap_or_default()),
    }
}

fn internal<E: std::fmt::Display>(err: E) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": err.to_string() })),
    )
}
