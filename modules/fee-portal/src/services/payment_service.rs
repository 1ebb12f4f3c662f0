//! Payment initialization and verification workflow
//!
//! The locally generated reference is the key for everything: a pending row is
//! written before the gateway is called, and a verification only ever moves the
//! row whose reference the provider reports back.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::PortalError;
use crate::gateway::{GatewayTransactionStatus, InitializeRequest, PaymentGateway};
use crate::models::{Payment, PaymentFormInput, PaymentStatus, VerifyQuery};
use crate::notifications::Notifier;
use crate::repos::{PaymentStore, StatusUpdate};
use crate::validation::validate_payment_form;

/// A pending payment and the checkout page to send the parent to
#[derive(Debug, Clone)]
pub struct InitializedPayment {
    pub payment: Payment,
    pub authorization_url: String,
}

/// A payment confirmed by the gateway
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub payment: Payment,
    /// False when the record was already successful before this verification
    pub newly_confirmed: bool,
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier,
    callback_url: String,
    currency: String,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Notifier,
        callback_url: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            callback_url: callback_url.into(),
            currency: currency.into(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Validate, record as pending, then open a gateway checkout
    ///
    /// A provider rejection marks the pending row failed. Communication errors
    /// leave it pending so the half-finished attempt stays on record.
    pub async fn initialize_payment(
        &self,
        input: &PaymentFormInput,
    ) -> Result<InitializedPayment, PortalError> {
        let new = validate_payment_form(input).map_err(PortalError::Validation)?;
        let reference = Uuid::new_v4().to_string();

        let payment = self.store.insert_pending(&new, &reference).await?;
        tracing::info!(
            payment_reference = %reference,
            amount = %payment.amount,
            provider = %self.gateway.provider(),
            "Pending payment recorded"
        );

        let request = InitializeRequest {
            email: payment.parent_email.clone(),
            amount: payment.amount,
            reference: reference.clone(),
            callback_url: self.callback_url.clone(),
            currency: self.currency.clone(),
            description: Some(format!(
                "School fees: {} ({}, {})",
                payment.student_name, payment.term, payment.session
            )),
        };

        match self.gateway.initialize(&request).await {
            Ok(checkout) => {
                if checkout.reference != reference {
                    tracing::warn!(
                        payment_reference = %reference,
                        gateway_reference = %checkout.reference,
                        "Gateway echoed a different reference; keeping ours"
                    );
                }
                Ok(InitializedPayment {
                    payment,
                    authorization_url: checkout.authorization_url,
                })
            }
            Err(e) => {
                tracing::warn!(
                    payment_reference = %reference,
                    error = %e,
                    "Gateway initialize failed"
                );
                if e.is_provider_rejection() {
                    if let Err(store_err) = self.store.mark_failed(&reference).await {
                        tracing::error!(
                            payment_reference = %reference,
                            error = %store_err,
                            "Failed to mark payment as failed"
                        );
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Confirm a gateway callback and record the outcome
    ///
    /// Anything short of a provider-confirmed, reference- and amount-matched
    /// success is a [`PortalError::Verification`]. Gateway communication
    /// errors leave every record untouched.
    pub async fn verify_payment(
        &self,
        query: &VerifyQuery,
    ) -> Result<VerifiedPayment, PortalError> {
        let target = query.target().ok_or_else(|| {
            PortalError::Verification("No transaction reference was supplied.".to_string())
        })?;

        let transaction = self.gateway.verify(&target).await?;

        let reported = transaction
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                PortalError::Verification(
                    "The payment provider did not report a payment reference.".to_string(),
                )
            })?;

        if let Some(claimed) = query.claimed_reference() {
            if claimed != reported {
                tracing::warn!(
                    claimed_reference = %claimed,
                    reported_reference = %reported,
                    "Callback reference does not match the verified transaction"
                );
                return Err(PortalError::Verification(
                    "The payment reference does not match the verified transaction.".to_string(),
                ));
            }
        }

        let payment = self.store.find_by_reference(reported).await?.ok_or_else(|| {
            tracing::warn!(
                reported_reference = %reported,
                "Verified transaction matches no payment"
            );
            PortalError::Verification("No payment matches this transaction.".to_string())
        })?;

        match transaction.status {
            GatewayTransactionStatus::Success => {}
            GatewayTransactionStatus::Failed => {
                if payment.status == PaymentStatus::Pending {
                    if let StatusUpdate::Applied(_) = self.store.mark_failed(reported).await? {
                        tracing::info!(payment_reference = %reported, "Payment marked failed");
                    }
                }
                let reason = transaction
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "The payment was not successful.".to_string());
                return Err(PortalError::Verification(reason));
            }
            GatewayTransactionStatus::Pending => {
                return Err(PortalError::Verification(
                    "The payment has not been completed yet.".to_string(),
                ));
            }
        }

        self.check_amount(&payment, transaction.amount, transaction.currency.as_deref())?;

        match self.store.mark_successful(reported).await? {
            StatusUpdate::Applied(payment) => {
                tracing::info!(
                    payment_reference = %payment.payment_reference,
                    amount = %payment.amount,
                    transaction_id = ?transaction.transaction_id,
                    "Payment marked successful"
                );
                self.notifier.notify(&payment);
                Ok(VerifiedPayment {
                    payment,
                    newly_confirmed: true,
                })
            }
            StatusUpdate::Unchanged(payment) if payment.status != PaymentStatus::Successful => {
                tracing::warn!(
                    payment_reference = %payment.payment_reference,
                    status = ?payment.status,
                    "Verified success for a payment that is no longer pending"
                );
                Err(PortalError::Verification(
                    "This payment was already recorded as failed. Please start a new payment."
                        .to_string(),
                ))
            }
            StatusUpdate::Unchanged(payment) => {
                tracing::debug!(
                    payment_reference = %payment.payment_reference,
                    "Payment already successful"
                );
                Ok(VerifiedPayment {
                    payment,
                    newly_confirmed: false,
                })
            }
            StatusUpdate::NotFound => Err(PortalError::Verification(
                "No payment matches this transaction.".to_string(),
            )),
        }
    }

    fn check_amount(
        &self,
        payment: &Payment,
        paid: Decimal,
        currency: Option<&str>,
    ) -> Result<(), PortalError> {
        if paid != payment.amount {
            tracing::warn!(
                payment_reference = %payment.payment_reference,
                expected = %payment.amount,
                paid = %paid,
                "Paid amount does not match the recorded amount"
            );
            return Err(PortalError::Verification(
                "The amount paid does not match the amount due.".to_string(),
            ));
        }

        if let Some(currency) = currency {
            if !currency.eq_ignore_ascii_case(&self.currency) {
                tracing::warn!(
                    payment_reference = %payment.payment_reference,
                    expected = %self.currency,
                    paid_currency = %currency,
                    "Paid currency does not match"
                );
                return Err(PortalError::Verification(
                    "The payment currency does not match.".to_string(),
                ));
            }
        }
        Ok(())
    }
}
