use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::GatewaySettings;
use crate::domain::errors::CheckoutError;
use crate::domain::ports::RemoteGateway;

/// REST client for the payment gateway's order-creation endpoint.
///
/// A slow or unreachable gateway surfaces as `CheckoutError::Gateway` after
/// the client timeout; it is never treated as success.
pub struct RestRemoteGateway {
    http: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct RemoteOrderBody {
    id: String,
}

impl RestRemoteGateway {
    pub fn new(settings: &GatewaySettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build gateway HTTP client");
        Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            key_id: settings.key_id.clone(),
            key_secret: settings.key_secret.clone(),
        }
    }
}

#[async_trait]
impl RemoteGateway for RestRemoteGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, CheckoutError> {
        let response = self
            .http
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "payment_capture": 1,
            }))
            .send()
            .await
            .map_err(|e| CheckoutError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("gateway order creation failed ({}): {}", status, body);
            return Err(CheckoutError::Gateway(format!(
                "gateway returned {}",
                status
            )));
        }

        let body: RemoteOrderBody = response
            .json()
            .await
            .map_err(|e| CheckoutError::Gateway(e.to_string()))?;
        Ok(body.id)
    }
}
