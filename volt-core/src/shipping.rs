use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Pickup or delivery point, addressed by carrier district/ward codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub district_code: Option<i32>,
    pub ward_code: Option<String>,
    pub street: String,
}

impl Address {
    pub fn is_routable(&self) -> bool {
        self.district_code.is_some() && self.ward_code.is_some()
    }
}

/// Physical parcel data the carrier prices on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub weight_grams: i64,
    pub length_cm: i64,
    pub width_cm: i64,
    pub height_cm: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    /// Carrier transport error or timeout. Retryable.
    #[error("carrier quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// Origin or destination is missing district/ward codes.
    #[error("address not routable: {0}")]
    InvalidAddress(String),
}

/// External shipping-carrier adapter. Returns a fee quote in the
/// smallest currency unit.
#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    async fn quote(
        &self,
        origin: &Address,
        destination: &Address,
        parcel: &Parcel,
        insured_value: i64,
    ) -> Result<i64, ShippingError>;
}

/// Deterministic carrier for tests and the dev profile: flat base fee
/// plus a per-kilogram component.
pub struct MockCarrier {
    base_fee: i64,
    per_kg: i64,
    unavailable: Mutex<bool>,
}

impl MockCarrier {
    pub fn new(base_fee: i64, per_kg: i64) -> Self {
        Self {
            base_fee,
            per_kg,
            unavailable: Mutex::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl ShippingCarrier for MockCarrier {
    async fn quote(
        &self,
        origin: &Address,
        destination: &Address,
        parcel: &Parcel,
        _insured_value: i64,
    ) -> Result<i64, ShippingError> {
        if *self.unavailable.lock().unwrap() {
            return Err(ShippingError::QuoteUnavailable("mock carrier down".into()));
        }
        if !origin.is_routable() {
            return Err(ShippingError::InvalidAddress("origin".into()));
        }
        if !destination.is_routable() {
            return Err(ShippingError::InvalidAddress("destination".into()));
        }
        let kgs = (parcel.weight_grams + 999) / 1000;
        Ok(self.base_fee + kgs * self.per_kg)
    }
}
