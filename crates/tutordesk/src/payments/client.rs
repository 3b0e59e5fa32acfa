//! HTTP client for the payment gateway.

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use url::Url;

use super::error::PaymentError;
use super::signature;

const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

/// Configuration for the payment gateway client.
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// Base URL for the gateway API
    pub api_base: String,
    /// Publishable key id (safe to hand to checkout clients)
    pub key_id: String,
    /// Secret key, used for basic auth and signature verification
    pub key_secret: String,
}

impl PaymentsConfig {
    /// Builds a config from `PAYMENTS_*` environment variables.
    pub fn from_env() -> Result<Self, PaymentError> {
        let require = |key: &str| {
            env::var(key).map_err(|_| PaymentError::Config {
                message: format!("{key} not set"),
            })
        };

        let api_base = env::var("PAYMENTS_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        Url::parse(&api_base)?;

        Ok(Self {
            api_base,
            key_id: require("PAYMENTS_KEY_ID")?,
            key_secret: require("PAYMENTS_KEY_SECRET")?,
        })
    }
}

/// An order the gateway has opened for us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Client for the payment gateway's order API.
pub struct PaymentsClient {
    client: Client,
    config: PaymentsConfig,
}

impl PaymentsClient {
    pub fn new(config: PaymentsConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// The publishable key checkout clients embed in the payment widget.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Opens an order with the gateway. Amount is in minor units (paise,
    /// cents). Order creation is not idempotent and the gateway offers no
    /// idempotency key, so failures are surfaced rather than retried.
    pub async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
        notes: &serde_json::Value,
    ) -> Result<PaymentOrder, PaymentError> {
        #[derive(Deserialize)]
        struct OrderResponse {
            id: String,
            amount: i64,
            currency: String,
            #[serde(default)]
            receipt: String,
        }

        let url = format!("{}/v1/orders", self.config.api_base);
        info!(amount = amount_minor_units, currency = currency, "Creating payment order");

        let body = json!({
            "amount": amount_minor_units,
            "currency": currency,
            "receipt": receipt,
            "notes": notes,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gateway rejected order");
            return Err(PaymentError::Rejected { message: body });
        }
        if !status.is_success() {
            return Err(PaymentError::UnexpectedResponse {
                message: format!("Order creation returned status {}", status),
            });
        }

        let parsed: OrderResponse =
            response
                .json()
                .await
                .map_err(|e| PaymentError::UnexpectedResponse {
                    message: format!("Malformed order response: {}", e),
                })?;

        Ok(PaymentOrder {
            order_id: parsed.id,
            amount: parsed.amount,
            currency: parsed.currency,
            receipt: parsed.receipt,
        })
    }

    /// Verifies a checkout callback signature against the secret key.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, sig: &str) -> bool {
        signature::verify(order_id, payment_id, sig, &self.config.key_secret)
    }
}
