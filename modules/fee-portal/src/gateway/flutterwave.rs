use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use super::types::{
    decimal_from_json, optional_id_from_json, Checkout, GatewayTransactionStatus,
    InitializeRequest, VerifiedTransaction, VerifyTarget,
};
use super::{
    check_initialize_request, ensure_path_safe, GatewayConfig, GatewayProvider, HttpTransport,
    PaymentGateway,
};

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    tx_ref: &'a str,
    /// Major units, serialized as a string
    amount: Decimal,
    currency: &'a str,
    redirect_url: &'a str,
    customer: CustomerRequest<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customizations: Option<Customizations<'a>>,
}

#[derive(Debug, Serialize)]
struct CustomerRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Customizations<'a> {
    title: &'a str,
}

/// Flutterwave v3 responses are wrapped as `{status: "success"|"error", message, data}`
#[derive(Debug, Deserialize)]
struct FlutterwaveEnvelope<T> {
    status: String,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkData {
    link: String,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    #[serde(default, deserialize_with = "optional_id_from_json")]
    id: Option<String>,
    tx_ref: Option<String>,
    status: String,
    #[serde(deserialize_with = "decimal_from_json")]
    amount: Decimal,
    currency: Option<String>,
    customer: Option<CustomerData>,
    processor_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    email: Option<String>,
}

/// Flutterwave Standard (hosted checkout) client
#[derive(Clone)]
pub struct FlutterwaveClient {
    transport: HttpTransport,
}

impl FlutterwaveClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Ok(FlutterwaveClient {
            transport: HttpTransport::new(config)?,
        })
    }

    fn unwrap_envelope<T>(envelope: FlutterwaveEnvelope<T>) -> Result<T, GatewayError> {
        if envelope.status != "success" {
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
impl PaymentGateway for FlutterwaveClient {
    fn provider(&self) -> GatewayProvider {
        GatewayProvider::Flutterwave
    }

    /// POST /payments
    async fn initialize(&self, request: &InitializeRequest) -> Result<Checkout, GatewayError> {
        check_initialize_request(request)?;

        let body = CreatePaymentRequest {
            tx_ref: &request.reference,
            amount: request.amount,
            currency: &request.currency,
            redirect_url: &request.callback_url,
            customer: CustomerRequest {
                email: &request.email,
            },
            customizations: request
                .description
                .as_deref()
                .map(|title| Customizations { title }),
        };

        let envelope: FlutterwaveEnvelope<PaymentLinkData> =
            self.transport.post("/payments", &body).await?;
        let data = Self::unwrap_envelope(envelope)?;

        Ok(Checkout {
            authorization_url: data.link,
            reference: request.reference.clone(),
        })
    }

    /// GET /transactions/{id}/verify or GET /transactions/verify_by_reference?tx_ref=
    async fn verify(&self, target: &VerifyTarget) -> Result<VerifiedTransaction, GatewayError> {
        let envelope: FlutterwaveEnvelope<TransactionData> = match target {
            VerifyTarget::TransactionId(id) => {
                let path = format!("/transactions/{}/verify", ensure_path_safe(id)?);
                self.transport.get(&path, &[]).await?
            }
            VerifyTarget::Reference(reference) => {
                self.transport
                    .get("/transactions/verify_by_reference", &[("tx_ref", reference.as_str())])
                    .await?
            }
        };
        let message = envelope.message.clone();
        let data = Self::unwrap_envelope(envelope)?;

        Ok(VerifiedTransaction {
            transaction_id: data.id,
            reference: data.tx_ref,
            status: map_status(&data.status),
            amount: data.amount,
            currency: data.currency,
            payer_email: data.customer.and_then(|c| c.email),
            message: data.processor_response.or(Some(message)),
        })
    }
}

fn map_status(status: &str) -> GatewayTransactionStatus {
    match status {
        "successful" => GatewayTransactionStatus::Success,
        "failed" | "cancelled" => GatewayTransactionStatus::Failed,
        _ => GatewayTransactionStatus::Pending,
    }
}
