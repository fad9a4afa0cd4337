//! Payment intents. The gateway sits behind a trait so the service never
//! depends on a particular payment provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};
use uphone_auth::prelude::*;

use crate::access::admit;
use crate::errors::{MarketError, MarketResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway is disabled")]
    Disabled,
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Creates an intent for `amount` minor currency units.
    async fn create_intent(&self, amount: u64, currency: &str) -> Result<PaymentIntent, GatewayError>;
}

/// Issues well-formed client secrets without contacting a provider.
#[derive(Clone, Debug, Default)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn name(&self) -> &'static str {
        "sandbox"
    }

    async fn create_intent(&self, amount: u64, currency: &str) -> Result<PaymentIntent, GatewayError> {
        if amount == 0 {
            return Err(GatewayError::Rejected("amount must be positive".into()));
        }
        let intent = uuid::Uuid::new_v4().simple().to_string();
        let secret = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(amount, currency, "sandbox payment intent created");
        Ok(PaymentIntent {
            client_secret: format!("pi_{intent}_secret_{secret}"),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn create_intent(&self, _amount: u64, _currency: &str) -> Result<PaymentIntent, GatewayError> {
        Err(GatewayError::Disabled)
    }
}

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        Self {
            gateway,
            currency: currency.into(),
        }
    }

    #[instrument(name = "payments.create_intent", skip(self, actor, request), fields(gateway = self.gateway.name()))]
    pub async fn create_intent(
        &self,
        actor: Option<&Actor>,
        request: PaymentIntentRequest,
    ) -> MarketResult<PaymentIntent> {
        admit(actor, Action::CreatePaymentIntent, &Resource::new("payment"))?;
        let amount = minor_units(request.price)?;
        self.gateway
            .create_intent(amount, &self.currency)
            .await
            .map_err(|err| {
                warn!(error = %err, "payment intent failed");
                match err {
                    GatewayError::Rejected(reason) => MarketError::invalid_input(&reason),
                    other => MarketError::transient(&other.to_string()),
                }
            })
    }
}

/// `price` in major units to an integer amount of minor units.
pub fn minor_units(price: f64) -> MarketResult<u64> {
    if !price.is_finite() || price <= 0.0 {
        return Err(MarketError::invalid_input("price must be a positive number"));
    }
    let cents = (price * 100.0).round();
    if cents < 1.0 || cents > u64::MAX as f64 {
        return Err(MarketError::invalid_input("price is out of range"));
    }
    Ok(cents as u64)
}
