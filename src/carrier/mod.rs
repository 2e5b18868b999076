use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// Service type sent with every rate quote and pickup request.
pub const SERVICE_TYPE: &str = "Pickup/Collect";

/// Body of the carrier's order-creation call. Field names are the carrier's
/// wire contract; do not rename.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub name: String,
    pub phone: String,
    pub phone2: String,
    pub address: String,
    pub cod_charge: i64,
    pub fbranch: String,
    pub branch: String,
    pub package: String,
}

/// The four carrier operations the reconciliation engine depends on.
/// Responses are externally-controlled JSON and are passed through without
/// validation; transport and HTTP failures surface as `AppError::Upstream`
/// unchanged.
#[async_trait]
pub trait CarrierApi: Send + Sync {
    async fn branch_list(&self) -> Result<Value, AppError>;

    async fn shipping_rate(
        &self,
        origin: &str,
        destination: &str,
        service_type: &str,
    ) -> Result<Value, AppError>;

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Value, AppError>;

    async fn order_status(&self, tracking_id: &str) -> Result<Value, AppError>;
}

/// HTTP client for the NCM API.
#[derive(Debug, Clone)]
pub struct NcmClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NcmClient {
    pub fn new(base_url: &str, api_key: &str, timeout: std::time::Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static configuration");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.api_key)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("carrier returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("invalid carrier response: {err}")))
    }
}

#[async_trait]
impl CarrierApi for NcmClient {
    async fn branch_list(&self) -> Result<Value, AppError> {
        let response = self
            .client
            .get(format!("{}/branchlist", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|err| AppError::Upstream(err.to_string()))?;

        Self::read_json(response).await
    }

    async fn shipping_rate(
        &self,
        origin: &str,
        destination: &str,
        service_type: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .client
            .get(format!("{}/shipping-rate", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .query(&[
                ("creation", origin),
                ("destination", destination),
                ("type", service_type),
            ])
            .send()
            .await
            .map_err(|err| AppError::Upstream(err.to_string()))?;

        Self::read_json(response).await
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Value, AppError> {
        let response = self
            .client
            .post(format!("{}/order/create", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(request)
            .send()
            .await
            .map_err(|err| AppError::Upstream(err.to_string()))?;

        Self::read_json(response).await
    }

    async fn order_status(&self, tracking_id: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .get(format!("{}/order/status", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .query(&[("id", tracking_id)])
            .send()
            .await
            .map_err(|err| AppError::Upstream(err.to_string()))?;

        Self::read_json(response).await
    }
}

/// First present field among `keys`, as a string. The carrier's schema is
/// not contractually stable, so identity and status fields are read through
/// prioritized fallback chains; numeric ids are stringified.
pub fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First present numeric field among `keys`. Accepts numbers or numeric
/// strings.
pub fn first_f64(payload: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match payload.get(key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{first_f64, first_string};

    #[test]
    fn first_string_walks_the_fallback_chain() {
        let payload = json!({ "order_id": "NCM-42" });
        assert_eq!(
            first_string(&payload, &["tracking_id", "id", "order_id"]),
            Some("NCM-42".to_string())
        );
    }

    #[test]
    fn first_string_prefers_earlier_keys() {
        let payload = json!({ "tracking_id": "T-1", "id": "T-2" });
        assert_eq!(
            first_string(&payload, &["tracking_id", "id"]),
            Some("T-1".to_string())
        );
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let payload = json!({ "id": 90210 });
        assert_eq!(
            first_string(&payload, &["tracking_id", "id"]),
            Some("90210".to_string())
        );
    }

    #[test]
    fn empty_strings_do_not_satisfy_a_key() {
        let payload = json!({ "tracking_id": "", "id": "T-2" });
        assert_eq!(
            first_string(&payload, &["tracking_id", "id"]),
            Some("T-2".to_string())
        );
        assert_eq!(first_string(&json!({}), &["tracking_id"]), None);
    }

    #[test]
    fn charges_parse_from_numbers_and_strings() {
        assert_eq!(first_f64(&json!({ "charge": 150 }), &["charge"]), Some(150.0));
        assert_eq!(
            first_f64(&json!({ "charge": "175.5" }), &["charge"]),
            Some(175.5)
        );
        assert_eq!(first_f64(&json!({}), &["charge"]), None);
    }
}
