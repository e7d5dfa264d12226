//! Stripe Checkout session creation: a form-encoded POST against the REST
//! API, no SDK.

use domain::Tier;
use uuid::Uuid;

use super::ServiceError;

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: &str, secret_key: &str) -> StripeClient {
        StripeClient {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Create a hosted Checkout session for one order in payment mode, with
    /// the order id in the session metadata so the webhook can find the row
    /// again. Returns the page URL the customer is redirected to.
    pub async fn create_checkout_session(
        &self,
        order_id: Uuid,
        email: &str,
        tier: Tier,
        public_base_url: &str,
    ) -> Result<String, ServiceError> {
        let success_url = format!("{public_base_url}/?success=true&order_id={order_id}");
        let cancel_url = format!("{public_base_url}/?canceled=true");

        let form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), success_url),
            ("cancel_url".to_string(), cancel_url),
            ("customer_email".to_string(), email.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                "usd".to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                tier.amount_cents().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                tier.product_name().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                tier.product_description().to_string(),
            ),
            ("metadata[order_id]".to_string(), order_id.to_string()),
            ("metadata[email]".to_string(), email.to_string()),
            ("metadata[tier]".to_string(), tier.as_str().to_string()),
        ];

        let res = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                service: "stripe",
                status,
                body,
            });
        }

        let body: serde_json::Value = res.json().await?;
        body.get("url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::Rejected("Stripe response missing checkout URL".to_string())
            })
    }
}
