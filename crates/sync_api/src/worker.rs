//! Post-payment processing: call the sync workflow, persist the artifacts,
//! deliver the download email. Runs on the background `JobSet` after the
//! webhook has already answered 200.

use chrono::{Duration, Utc};
use domain::SyncJob;
use uuid::Uuid;

use crate::services::DownloadEmail;
use crate::state::AppState;

/// Download links stay live for a week.
const LINK_EXPIRY_DAYS: i64 = 7;

pub async fn run_order(state: AppState, order_id: Uuid) {
    let order = match db::get_order(&state.db, order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            tracing::error!(%order_id, "processing started for unknown order");
            return;
        }
        Err(e) => {
            tracing::error!(%order_id, "order lookup failed: {e}");
            return;
        }
    };
    let Some(tier) = order.tier() else {
        let _ = db::mark_failed(&state.db, order_id, "order has an unknown tier").await;
        return;
    };

    let job = SyncJob {
        audio_url: order.audio_url.clone(),
        lyrics: order.lyrics.clone(),
        email: order.email.clone(),
        tier,
    };

    match state.engine.process(&job).await {
        Ok(outputs) => {
            let expires_at = Utc::now() + Duration::days(LINK_EXPIRY_DAYS);
            match db::record_outputs(&state.db, order_id, &outputs, expires_at).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(%order_id, "order left processing before outputs were recorded");
                    return;
                }
                Err(e) => {
                    tracing::error!(%order_id, "failed to record outputs: {e}");
                    return;
                }
            }
            tracing::info!(%order_id, "sync outputs recorded");

            let email = DownloadEmail {
                to: order.email.clone(),
                order_id,
                tier,
                lrc_url: outputs.lrc_url.clone(),
                srt_url: outputs.srt_url.clone(),
                video_url: outputs.video_url.clone(),
                lrc_content: outputs.lrc_content.clone(),
                srt_content: outputs.srt_content.clone(),
                expires_at,
            };
            // A failed send does not fail the order: the files exist and the
            // status endpoint still serves the URLs.
            if let Err(e) = state.mailer.send_download_email(&email).await {
                tracing::warn!(%order_id, "download email failed: {e}");
                let _ = db::record_delivery_error(
                    &state.db,
                    order_id,
                    &format!("email delivery failed: {e}"),
                )
                .await;
            } else {
                tracing::info!(%order_id, "download email sent");
            }
        }
        Err(e) => {
            tracing::warn!(%order_id, "sync workflow failed: {e}");
            if let Err(db_err) = db::mark_failed(&state.db, order_id, &e.to_string()).await {
                tracing::error!(%order_id, "failed to mark order failed: {db_err}");
            }
        }
    }
}
