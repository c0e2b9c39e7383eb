use bo_common::Paise;
use chrono::Utc;
use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::PaymentConfig, errors::ServerError};

/// The gateway-side representation of a pending payment. Only the fields this system depends on are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not initialize payment gateway client. {0}")]
    Initialization(String),
    #[error("Payment gateway request failed. {0}")]
    RequestError(String),
    #[error("Payment gateway returned {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("Amount must be a positive integer.")]
    InvalidAmount,
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidAmount => ServerError::InvalidRequestBody(e.to_string()),
            other => ServerError::UpstreamError(other.to_string()),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Obtain a gateway order id for the given amount. The amount is in the minor currency unit; upstream failures
    /// surface as errors and are never retried here.
    async fn create_order(&self, amount: Paise, currency: &str) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    config: PaymentConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { client, config })
    }
}

impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(&self, amount: Paise, currency: &str) -> Result<GatewayOrder, GatewayError> {
        if !amount.is_positive() {
            return Err(GatewayError::InvalidAmount);
        }
        let receipt = format!("receipt_{}", Utc::now().timestamp_millis());
        let body = CreateOrderBody { amount: amount.value(), currency, receipt };
        let url = format!("{}/orders", self.config.api_url);
        trace!("💳️ Creating gateway order for {amount}");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            let order =
                response.json::<GatewayOrder>().await.map_err(|e| GatewayError::RequestError(e.to_string()))?;
            debug!("💳️ Gateway order {} created for {amount}", order.id);
            Ok(order)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayError::RequestError(e.to_string()))?;
            warn!("💳️ Gateway order creation failed with {status}: {message}");
            Err(GatewayError::ApiError { status, message })
        }
    }
}
