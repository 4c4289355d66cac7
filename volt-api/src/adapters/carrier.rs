use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use volt_core::shipping::{Address, Parcel, ShippingCarrier, ShippingError};

/// Live carrier adapter for a GHN-style fee endpoint. Responses are
/// parsed against a fixed schema and fail closed on any mismatch.
pub struct GhnCarrier {
    http: Client,
    base_url: String,
    token: String,
    shop_id: i64,
}

impl GhnCarrier {
    pub fn new(base_url: String, token: String, shop_id: i64, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            shop_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct FeeRequest<'a> {
    service_type_id: i32,
    from_district_id: i32,
    to_district_id: i32,
    to_ward_code: &'a str,
    weight: i64,
    length: i64,
    width: i64,
    height: i64,
    insurance_value: i64,
}

#[derive(Debug, Deserialize)]
struct FeeResponse {
    code: i32,
    message: Option<String>,
    data: Option<FeeData>,
}

#[derive(Debug, Deserialize)]
struct FeeData {
    total: i64,
}

#[async_trait]
impl ShippingCarrier for GhnCarrier {
    async fn quote(
        &self,
        origin: &Address,
        destination: &Address,
        parcel: &Parcel,
        insured_value: i64,
    ) -> Result<i64, ShippingError> {
        let from_district = origin
            .district_code
            .ok_or_else(|| ShippingError::InvalidAddress("origin district missing".into()))?;
        let to_district = destination
            .district_code
            .ok_or_else(|| ShippingError::InvalidAddress("destination district missing".into()))?;
        let to_ward = destination
            .ward_code
            .as_deref()
            .ok_or_else(|| ShippingError::InvalidAddress("destination ward missing".into()))?;

        let url = format!("{}/shiip/public-api/v2/shipping-order/fee", self.base_url);
        let res = self
            .http
            .post(&url)
            .header("Token", &self.token)
            .header("ShopId", self.shop_id.to_string())
            .json(&FeeRequest {
                service_type_id: 2,
                from_district_id: from_district,
                to_district_id: to_district,
                to_ward_code: to_ward,
                weight: parcel.weight_grams,
                length: parcel.length_cm,
                width: parcel.width_cm,
                height: parcel.height_cm,
                insurance_value: insured_value,
            })
            .send()
            .await
            .map_err(|e| ShippingError::QuoteUnavailable(e.to_string()))?;

        if !res.status().is_success() {
            return Err(ShippingError::QuoteUnavailable(format!(
                "carrier returned {}",
                res.status()
            )));
        }

        let body: FeeResponse = res
            .json()
            .await
            .map_err(|e| ShippingError::QuoteUnavailable(format!("malformed fee response: {}", e)))?;
        if body.code != 200 {
            return Err(ShippingError::QuoteUnavailable(
                body.message.unwrap_or_else(|| format!("carrier code {}", body.code)),
            ));
        }
        body.data
            .map(|d| d.total)
            .ok_or_else(|| ShippingError::QuoteUnavailable("fee response missing data".into()))
    }
}
