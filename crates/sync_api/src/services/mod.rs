//! Clients for the external collaborators: Stripe Checkout, the
//! synchronization workflow engine, and the Resend email API. Each is
//! constructed once at startup and injected through `AppState`; the traits
//! let tests substitute them.

use async_trait::async_trait;
use domain::{SyncJob, SyncOutputs};
use thiserror::Error;

pub mod engine;
pub mod mailer;
pub mod stripe;

pub use engine::HttpSyncEngine;
pub use mailer::{DownloadEmail, ResendMailer};
pub use stripe::StripeClient;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Rejected(String),
}

/// External synchronization/transcription workflow.
#[async_trait]
pub trait SyncEngine: Send + Sync {
    async fn process(&self, job: &SyncJob) -> Result<SyncOutputs, ServiceError>;
}

/// Transactional email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_download_email(&self, email: &DownloadEmail) -> Result<(), ServiceError>;
}
