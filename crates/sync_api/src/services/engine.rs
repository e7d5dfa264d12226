//! HTTP client for the external synchronization workflow. One POST carries
//! the audio URL, lyrics, and tier flags; the response carries the artifact
//! URLs and file contents.

use async_trait::async_trait;
use domain::{SyncJob, SyncOutputs};
use serde::Deserialize;

use super::{ServiceError, SyncEngine};

pub struct HttpSyncEngine {
    http: reqwest::Client,
    workflow_url: String,
    api_key: String,
}

impl HttpSyncEngine {
    pub fn new(workflow_url: &str, api_key: &str) -> HttpSyncEngine {
        HttpSyncEngine {
            http: reqwest::Client::new(),
            workflow_url: workflow_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowResponse {
    status: String,
    #[serde(default)]
    outputs: Option<SyncOutputs>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl SyncEngine for HttpSyncEngine {
    async fn process(&self, job: &SyncJob) -> Result<SyncOutputs, ServiceError> {
        let body = serde_json::json!({
            "audioUrl": job.audio_url,
            "lyrics": job.lyrics,
            "email": job.email,
            "tier": job.tier,
            "includeLrc": true,
            "includeSrt": true,
            "includeVideo": job.tier.includes_video(),
        });

        let res = self
            .http
            .post(&self.workflow_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                service: "sync workflow",
                status,
                body,
            });
        }

        let parsed: WorkflowResponse = res.json().await?;
        if parsed.status != "success" {
            return Err(ServiceError::Rejected(
                parsed
                    .error
                    .unwrap_or_else(|| "sync workflow reported an error".to_string()),
            ));
        }
        parsed.outputs.ok_or_else(|| {
            ServiceError::Rejected("sync workflow returned no outputs".to_string())
        })
    }
}
