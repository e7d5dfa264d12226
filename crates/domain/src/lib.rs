use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pricing and feature level selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Pro,
}

impl Tier {
    pub fn parse(s: &str) -> Option<Tier> {
        match s {
            "standard" => Some(Tier::Standard),
            "pro" => Some(Tier::Pro),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Pro => "pro",
        }
    }

    /// Checkout amount in US cents.
    pub fn amount_cents(&self) -> i64 {
        match self {
            Tier::Standard => 500,
            Tier::Pro => 1200,
        }
    }

    pub fn product_name(&self) -> &'static str {
        match self {
            Tier::Standard => "SyncDrop Standard",
            Tier::Pro => "SyncDrop Pro",
        }
    }

    pub fn product_description(&self) -> &'static str {
        match self {
            Tier::Standard => ".lrc + .srt lyric files",
            Tier::Pro => ".lrc + .srt lyric files + 1080p karaoke video",
        }
    }

    /// Pro tier includes the rendered karaoke video.
    pub fn includes_video(&self) -> bool {
        matches!(self, Tier::Pro)
    }
}

/// Order lifecycle. Advances pending -> processing -> done, or
/// processing -> failed. Terminal states never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "done" => Some(OrderStatus::Done),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Done => "done",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done | OrderStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted Stripe Checkout page the client should redirect to.
    pub url: String,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputUrls {
    pub lrc_url: Option<String>,
    pub srt_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: OrderStatus,
    /// Present only once the order is done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<OutputUrls>,
    /// Present only when the order failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Input to the external synchronization workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub audio_url: String,
    pub lyrics: String,
    pub email: String,
    pub tier: Tier,
}

/// Artifacts returned by the synchronization workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutputs {
    pub lrc_url: String,
    pub srt_url: String,
    pub lrc_content: String,
    pub srt_content: String,
    pub video_url: Option<String>,
}
