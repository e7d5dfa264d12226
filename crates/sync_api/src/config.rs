//! Service configuration, read from the environment once at startup and
//! injected through `AppState` so handlers never reach for globals.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    /// Public origin of this deployment; used for upload URLs and the
    /// Stripe success/cancel redirects.
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    pub sync_workflow_url: String,
    pub sync_api_key: String,
    pub resend_api_key: String,
    pub resend_api_base: String,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Result<Config, String> {
        Ok(Config {
            bind_addr: optional("BIND_ADDR", "0.0.0.0:8080"),
            database_url: optional("DATABASE_URL", "sqlite://syncdrop.db?mode=rwc"),
            public_base_url: optional("PUBLIC_BASE_URL", "http://localhost:8080"),
            upload_dir: PathBuf::from(optional("UPLOAD_DIR", "uploads")),
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            stripe_api_base: optional("STRIPE_API_BASE", "https://api.stripe.com"),
            sync_workflow_url: required("SYNC_WORKFLOW_URL")?,
            sync_api_key: required("SYNC_API_KEY")?,
            resend_api_key: required("RESEND_API_KEY")?,
            resend_api_base: optional("RESEND_API_BASE", "https://api.resend.com"),
            mail_from: optional("MAIL_FROM", "SyncDrop <noreply@syncdrop.app>"),
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("{key} not configured"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
