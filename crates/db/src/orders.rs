//! Orders table access. One row tracks a paid sync request from checkout
//! submission to delivery. Status only advances: pending -> processing ->
//! done, or processing -> failed; every transition guards on the prior
//! status so late or duplicate writers cannot move a row backwards.

use chrono::{DateTime, Utc};
use domain::{OrderStatus, SyncOutputs, Tier};
use uuid::Uuid;

use crate::DbPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: String,
    pub email: String,
    pub tier: String,
    pub audio_url: String,
    pub lyrics: String,
    pub status: String,
    pub stripe_payment_intent_id: Option<String>,
    pub lrc_url: Option<String>,
    pub srt_url: Option<String>,
    pub video_url: Option<String>,
    pub error_message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::parse(&self.status)
    }

    pub fn tier(&self) -> Option<Tier> {
        Tier::parse(&self.tier)
    }
}

#[derive(Debug)]
pub struct NewOrder<'a> {
    pub email: &'a str,
    pub tier: Tier,
    pub audio_url: &'a str,
    pub lyrics: &'a str,
}

/// Insert a pending order at checkout-session creation. Returns the new id.
pub async fn insert_order(pool: &DbPool, new: NewOrder<'_>) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO orders (id, email, tier, audio_url, lyrics, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(new.email)
    .bind(new.tier.as_str())
    .bind(new.audio_url)
    .bind(new.lyrics)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn get_order(pool: &DbPool, id: Uuid) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Most recent order for an email (status polling key).
pub async fn latest_order_by_email(
    pool: &DbPool,
    email: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE email = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Most recent pending order for an email. Webhook fallback when the event
/// metadata carries no order id.
pub async fn latest_pending_order_by_email(
    pool: &DbPool,
    email: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT id FROM orders
        WHERE email = ? AND status = 'pending'
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|(s,)| Uuid::parse_str(&s).ok()))
}

/// Atomically claim a pending order for processing, recording the payment
/// intent that triggered it. Returns false when the order was already
/// claimed (duplicate webhook delivery) or does not exist, so the caller
/// must not start a second processing run.
pub async fn claim_for_processing(
    pool: &DbPool,
    id: Uuid,
    payment_intent_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'processing', stripe_payment_intent_id = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(payment_intent_id)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Persist workflow outputs and advance the order to done. Only reachable
/// from processing. Returns false if the row was not in processing.
pub async fn record_outputs(
    pool: &DbPool,
    id: Uuid,
    outputs: &SyncOutputs,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'done', lrc_url = ?, srt_url = ?, video_url = ?,
            expires_at = ?, updated_at = ?
        WHERE id = ? AND status = 'processing'
        "#,
    )
    .bind(&outputs.lrc_url)
    .bind(&outputs.srt_url)
    .bind(outputs.video_url.as_deref())
    .bind(expires_at)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Terminal failure with the captured error text. Only reachable from
/// processing; a done order never reverts.
pub async fn mark_failed(pool: &DbPool, id: Uuid, message: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'failed', error_message = ?, updated_at = ?
        WHERE id = ? AND status = 'processing'
        "#,
    )
    .bind(message)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Note an email-send failure on a delivered order. The order stays done;
/// the files exist and the customer can still poll for the URLs.
pub async fn record_delivery_error(
    pool: &DbPool,
    id: Uuid,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET error_message = ?, updated_at = ? WHERE id = ? AND status = 'done'",
    )
    .bind(message)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}
