use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use super::types::{
    optional_id_from_json, Checkout, GatewayTransactionStatus, InitializeRequest,
    VerifiedTransaction, VerifyTarget,
};
use super::{
    check_initialize_request, ensure_path_safe, GatewayConfig, GatewayProvider, HttpTransport,
    PaymentGateway,
};

#[derive(Debug, Serialize)]
struct InitializeTransactionRequest<'a> {
    email: &'a str,
    /// Minor units (kobo)
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

/// Every Paystack response is wrapped as `{status, message, data}`
#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    #[serde(default, deserialize_with = "optional_id_from_json")]
    id: Option<String>,
    status: String,
    reference: Option<String>,
    /// Minor units (kobo)
    amount: i64,
    currency: Option<String>,
    customer: Option<CustomerData>,
    gateway_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    email: Option<String>,
}

/// Paystack hosted-checkout client
#[derive(Clone)]
pub struct PaystackClient {
    transport: HttpTransport,
}

impl PaystackClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(PaystackClient {
            transport: HttpTransport::new(config)?,
        })
    }

    fn unwrap_envelope<T>(envelope: PaystackEnvelope<T>) -> Result<T, GatewayError> {
        if !envelope.status {
            return Err(GatewayError::Rejected {
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| GatewayError::ParseError("response is missing data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    fn provider(&self) -> GatewayProvider {
        GatewayProvider::Paystack
    }

    /// POST /transaction/initialize
    async fn initialize(&self, request: &InitializeRequest) -> Result<Checkout, GatewayError> {
        check_initialize_request(request)?;

        let body = InitializeTransactionRequest {
            email: &request.email,
            amount: to_minor_units(request.amount)?,
            reference: &request.reference,
            callback_url: &request.callback_url,
            currency: &request.currency,
            metadata: request
                .description
                .as_ref()
                .map(|d| serde_json::json!({ "description": d })),
        };

        let envelope: PaystackEnvelope<InitializeData> =
            self.transport.post("/transaction/initialize", &body).await?;
        let data = Self::unwrap_envelope(envelope)?;

        Ok(Checkout {
            authorization_url: data.authorization_url,
            reference: data.reference,
        })
    }

    /// GET /transaction/verify/{reference} or GET /transaction/{id}
    async fn verify(&self, target: &VerifyTarget) -> Result<VerifiedTransaction, GatewayError> {
        let path = match target {
            VerifyTarget::Reference(reference) => {
                format!("/transaction/verify/{}", ensure_path_safe(reference)?)
            }
            VerifyTarget::TransactionId(id) => format!("/transaction/{}", ensure_path_safe(id)?),
        };

        let envelope: PaystackEnvelope<TransactionData> = self.transport.get(&path, &[]).await?;
        let message = envelope.message.clone();
        let data = Self::unwrap_envelope(envelope)?;

        Ok(VerifiedTransaction {
            transaction_id: data.id,
            reference: data.reference,
            status: map_status(&data.status),
            amount: Decimal::new(data.amount, 2),
            currency: data.currency,
            payer_email: data.customer.and_then(|c| c.email),
            message: data.gateway_response.or(Some(message)),
        })
    }
}

fn map_status(status: &str) -> GatewayTransactionStatus {
    match status {
        "success" => GatewayTransactionStatus::Success,
        "failed" | "reversed" => GatewayTransactionStatus::Failed,
        _ => GatewayTransactionStatus::Pending,
    }
}

/// Naira to kobo; refuses fractions of a kobo
pub(crate) fn to_minor_units(amount: Decimal) -> Result<i64, GatewayError> {
    let minor = amount * Decimal::ONE_HUNDRED;
    if !minor.fract().is_zero() {
        return Err(GatewayError::InvalidRequest(format!(
            "amount {amount} has more than 2 decimal places"
        )));
    }
    minor
        .to_i64()
        .ok_or_else(|| GatewayError::InvalidRequest(format!("amount {amount} is out of range")))
}
