use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Status reported by the external gateway for one payment attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Pending,
    Success,
    Fail,
}

/// Handle returned when a payment is opened with the gateway. The
/// `redirect_ref` is the QR/redirect URL handed back to the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    pub gateway_order_id: String,
    pub order_id: Uuid,
    pub amount: i64,
    pub redirect_ref: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (network, 5xx, timeout). Retryable; never
    /// a statement about the payment itself.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway explicitly rejected the request.
    #[error("gateway rejected request: {0}")]
    Rejected(String),

    /// Response arrived but did not match the expected schema.
    #[error("gateway response malformed: {0}")]
    Malformed(String),
}

/// External payment-gateway adapter. Untrusted and occasionally
/// unavailable; callers bound every call with a timeout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment with the gateway for the given order and amount.
    async fn create_intent(&self, order_id: Uuid, amount: i64) -> Result<GatewayIntent, GatewayError>;

    /// Poll the gateway for the current status of a payment.
    async fn check_status(&self, gateway_order_id: &str) -> Result<GatewayStatus, GatewayError>;
}

/// In-memory gateway for tests and the dev profile. Intents start
/// `Pending`; tests drive them terminal via `resolve`.
#[derive(Default)]
pub struct MockGateway {
    statuses: Mutex<HashMap<String, GatewayStatus>>,
    fail_transport: Mutex<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force subsequent calls to fail at the transport level.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.fail_transport.lock().unwrap() = unavailable;
    }

    /// Move a previously created intent to a terminal status.
    pub fn resolve(&self, gateway_order_id: &str, status: GatewayStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(gateway_order_id.to_string(), status);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, order_id: Uuid, amount: i64) -> Result<GatewayIntent, GatewayError> {
        if *self.fail_transport.lock().unwrap() {
            return Err(GatewayError::Unavailable("mock transport down".into()));
        }
        let gateway_order_id = format!("gw_{}", order_id.simple());
        self.statuses
            .lock()
            .unwrap()
            .insert(gateway_order_id.clone(), GatewayStatus::Pending);
        Ok(GatewayIntent {
            redirect_ref: format!("https://pay.example.test/qr/{}", gateway_order_id),
            gateway_order_id,
            order_id,
            amount,
            created_at: Utc::now(),
        })
    }

    async fn check_status(&self, gateway_order_id: &str) -> Result<GatewayStatus, GatewayError> {
        if *self.fail_transport.lock().unwrap() {
            return Err(GatewayError::Unavailable("mock transport down".into()));
        }
        self.statuses
            .lock()
            .unwrap()
            .get(gateway_order_id)
            .copied()
            .ok_or_else(|| GatewayError::Rejected(format!("unknown intent {}", gateway_order_id)))
    }
}
