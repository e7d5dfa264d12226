use std::sync::Arc;

use crate::config::Config;
use crate::jobs::JobSet;
use crate::services::{HttpSyncEngine, Mailer, ResendMailer, StripeClient, SyncEngine};

/// Shared app state for Axum handlers. Clients are built once at startup
/// and injected so tests can substitute them.
#[derive(Clone)]
pub struct AppState {
    pub db: db::DbPool,
    pub config: Arc<Config>,
    pub stripe: Arc<StripeClient>,
    pub engine: Arc<dyn SyncEngine>,
    pub mailer: Arc<dyn Mailer>,
    pub jobs: JobSet,
}

impl AppState {
    /// Wire the real HTTP clients from config.
    pub fn new(db: db::DbPool, config: Arc<Config>) -> AppState {
        let stripe = Arc::new(StripeClient::new(
            &config.stripe_api_base,
            &config.stripe_secret_key,
        ));
        let engine = Arc::new(HttpSyncEngine::new(
            &config.sync_workflow_url,
            &config.sync_api_key,
        ));
        let mailer = Arc::new(ResendMailer::new(
            &config.resend_api_base,
            &config.resend_api_key,
            &config.mail_from,
        ));
        AppState::with_services(db, config, stripe, engine, mailer)
    }

    pub fn with_services(
        db: db::DbPool,
        config: Arc<Config>,
        stripe: Arc<StripeClient>,
        engine: Arc<dyn SyncEngine>,
        mailer: Arc<dyn Mailer>,
    ) -> AppState {
        AppState {
            db,
            config,
            stripe,
            engine,
            mailer,
            jobs: JobSet::default(),
        }
    }
}
