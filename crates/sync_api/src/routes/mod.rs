use axum::Router;

use crate::state::AppState;

pub mod checkout;
pub mod status;
pub mod stripe_webhook;
pub mod uploads;

/// Build the API router (checkout, payment webhook, status polling).
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(checkout::router(state.clone()))
        .merge(stripe_webhook::router(state.clone()))
        .merge(status::router(state))
}
