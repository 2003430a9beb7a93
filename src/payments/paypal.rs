use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::AppConfig;

use super::{GatewayError, IntentRequest, PaymentGateway, PaymentIntent};

/// PayPal REST gateway. Exchanges client credentials for a bearer token,
/// registers a payment with the itemized list and total, and hands back the
/// approval link the customer is redirected to.
#[derive(Clone)]
pub struct PaypalGateway {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    return_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: String,
    #[serde(default)]
    links: Vec<PaymentLink>,
}

#[derive(Debug, Deserialize)]
struct PaymentLink {
    href: String,
    rel: String,
}

impl PaypalGateway {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, anyhow::Error> {
        let client_id = cfg
            .paypal_client_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("paypal_client_id is required when gateway_mode = \"paypal\""))?;
        let client_secret = cfg
            .paypal_client_secret
            .clone()
            .ok_or_else(|| anyhow::anyhow!("paypal_client_secret is required when gateway_mode = \"paypal\""))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.gateway_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.paypal_base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            return_url: cfg.checkout_return_url.clone(),
            cancel_url: cfg.checkout_cancel_url.clone(),
        })
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "token request returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("malformed token response: {}", e)))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    #[instrument(skip(self, request), fields(total = %request.total, currency = %request.currency))]
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let token = self.access_token().await?;

        let items: Vec<serde_json::Value> = request
            .items
            .iter()
            .map(|item| {
                json!({
                    "name": item.title,
                    "sku": item.sku,
                    "price": format!("{:.2}", item.unit_price),
                    "currency": request.currency,
                    "quantity": item.quantity,
                })
            })
            .collect();

        let body = json!({
            "intent": "sale",
            "payer": { "payment_method": "paypal" },
            "redirect_urls": {
                "return_url": self.return_url,
                "cancel_url": self.cancel_url,
            },
            "transactions": [{
                "item_list": { "items": items },
                "amount": {
                    "currency": request.currency,
                    "total": format!("{:.2}", request.total),
                },
                "description": request.description,
            }],
        });

        let response = self
            .http
            .post(format!("{}/v1/payments/payment", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("payment request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Unavailable(format!(
                "payment request returned {}: {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "payment request returned {}: {}",
                status, body
            )));
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("malformed payment response: {}", e)))?;

        debug!(intent_id = %payment.id, "payment intent registered");

        let approval_url = payment
            .links
            .iter()
            .find(|link| link.rel == "approval_url")
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                GatewayError::Rejected("payment response carried no approval link".to_string())
            })?;

        Ok(PaymentIntent {
            intent_id: payment.id,
            approval_url,
        })
    }
}
