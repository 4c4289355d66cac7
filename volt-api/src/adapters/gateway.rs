use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use volt_core::payment::{GatewayError, GatewayIntent, GatewayStatus, PaymentGateway};

/// Live adapter for a QR payment gateway with an intent/poll API.
/// Payloads are parsed against fixed schemas; an unknown status string
/// is a typed error, never silently treated as pending.
pub struct QrGateway {
    http: Client,
    base_url: String,
    api_key: String,
}

impl QrGateway {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateIntentRequest<'a> {
    order_id: &'a str,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct CreateIntentResponse {
    intent_id: String,
    qr_url: String,
}

#[derive(Debug, Deserialize)]
struct IntentStatusResponse {
    status: String,
}

#[async_trait]
impl PaymentGateway for QrGateway {
    async fn create_intent(&self, order_id: Uuid, amount: i64) -> Result<GatewayIntent, GatewayError> {
        let url = format!("{}/v1/intents", self.base_url);
        let order_ref = order_id.to_string();
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CreateIntentRequest {
                order_id: &order_ref,
                amount,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let status = res.status();
        if status.is_client_error() {
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!("gateway returned {}", status)));
        }

        let body: CreateIntentResponse = res
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(GatewayIntent {
            gateway_order_id: body.intent_id,
            order_id,
            amount,
            redirect_ref: body.qr_url,
            created_at: Utc::now(),
        })
    }

    async fn check_status(&self, gateway_order_id: &str) -> Result<GatewayStatus, GatewayError> {
        let url = format!("{}/v1/intents/{}", self.base_url, gateway_order_id);
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if !res.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "gateway returned {}",
                res.status()
            )));
        }

        let body: IntentStatusResponse = res
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        match body.status.as_str() {
            "PENDING" => Ok(GatewayStatus::Pending),
            "SUCCESS" => Ok(GatewayStatus::Success),
            "FAIL" => Ok(GatewayStatus::Fail),
            other => Err(GatewayError::Malformed(format!("unknown status {:?}", other))),
        }
    }
}
