//! Serve uploaded audio files so the sync workflow can fetch them by public
//! URL.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::state::AppState;

pub fn router(_state: AppState) -> Router<AppState> {
    Router::new().route("/uploads/*path", get(serve_upload))
}

async fn serve_upload(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let path = path.replace('\\', "/");
    if path.is_empty() || path.contains("..") {
        return plain(StatusCode::BAD_REQUEST, "invalid path");
    }
    let full = state.config.upload_dir.join(&path);
    if !full.is_file() {
        return plain(StatusCode::NOT_FOUND, "not found");
    }
    match tokio::fs::read(&full).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&full).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(data))
                .unwrap()
        }
        Err(_) => plain(StatusCode::INTERNAL_SERVER_ERROR, "read error"),
    }
}

fn plain(status: StatusCode, msg: &'static str) -> Response {
    Response::builder()
        .status(status)
        .body(Body::from(msg))
        .unwrap()
}
