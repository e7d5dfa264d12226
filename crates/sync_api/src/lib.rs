pub mod config;
pub mod jobs;
pub mod routes;
pub mod services;
pub mod state;
pub mod worker;

use axum::{routing::get, Json, Router};

use state::AppState;

/// Build the full application: API under /api, uploads at the root.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(routes::router(state.clone()));

    Router::new()
        .nest("/api", api)
        .merge(routes::uploads::router(state.clone()))
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "error",
    };
    Json(serde_json::json!({ "ok": true, "db": db_status }))
}
