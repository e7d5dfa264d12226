//! Download-delivery email via the Resend REST API. The generated `.lrc`
//! and `.srt` files ride along as base64 attachments; the body links the
//! hosted copies and warns about link expiry.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use domain::Tier;
use uuid::Uuid;

use super::{Mailer, ServiceError};

#[derive(Debug, Clone)]
pub struct DownloadEmail {
    pub to: String,
    pub order_id: Uuid,
    pub tier: Tier,
    pub lrc_url: String,
    pub srt_url: String,
    pub video_url: Option<String>,
    pub lrc_content: String,
    pub srt_content: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ResendMailer {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_base: &str, api_key: &str, from: &str) -> ResendMailer {
        ResendMailer {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_download_email(&self, email: &DownloadEmail) -> Result<(), ServiceError> {
        let body = serde_json::json!({
            "from": self.from,
            "to": email.to,
            "subject": "Your SyncDrop files are ready",
            "html": render_download_email(email),
            "attachments": [
                {
                    "filename": format!("song-{}.lrc", email.order_id),
                    "content": BASE64_STANDARD.encode(&email.lrc_content),
                },
                {
                    "filename": format!("song-{}.srt", email.order_id),
                    "content": BASE64_STANDARD.encode(&email.srt_content),
                },
            ],
        });

        let res = self
            .http
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                service: "resend",
                status,
                body,
            });
        }
        Ok(())
    }
}

fn render_download_email(email: &DownloadEmail) -> String {
    let video_item = match email.video_url.as_deref() {
        Some(url) => format!(
            r#"<li><a href="{url}">1080p karaoke video</a> (pro tier)</li>"#
        ),
        None => String::new(),
    };
    let expires = email.expires_at.format("%d %B %Y");
    format!(
        r#"<html>
<body>
  <h1>SyncDrop</h1>
  <h2>Your files are ready</h2>
  <p>Thanks for using SyncDrop. Your lyric sync files are attached and
  available to download:</p>
  <ul>
    <li><a href="{lrc_url}">.lrc file</a> (Spotify, Apple Music compatible)</li>
    <li><a href="{srt_url}">.srt file</a> (subtitle format for video editing)</li>
    {video_item}
  </ul>
  <p><strong>Important:</strong> the download links expire on {expires}.</p>
  <p>Order ID: <code>{order_id}</code></p>
</body>
</html>"#,
        lrc_url = email.lrc_url,
        srt_url = email.srt_url,
        video_item = video_item,
        expires = expires,
        order_id = email.order_id,
    )
}
