//! Payment confirmation emails
//!
//! Delivery is best-effort: [`Notifier::notify`] spawns the send and returns
//! immediately, and any failure is logged and dropped.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::{Branding, MailConfig};
use crate::models::{format_money, Payment};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Mail relay error (status {status_code}): {message}")]
    RelayError { status_code: u16, message: String },
}

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Sends mail through a JSON relay API authenticated with a bearer key
#[derive(Clone)]
pub struct HttpMailer {
    endpoint: String,
    api_key: String,
    http_client: Client,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::HttpError(e.to_string()))?;

        Ok(Self {
            endpoint: config.api_url.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| MailError::HttpError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(MailError::RelayError {
            status_code: status.as_u16(),
            message,
        })
    }
}

/// Logs instead of sending; used when no relay is configured
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = ?message.to,
            subject = %message.subject,
            "Mail relay not configured; confirmation email logged only"
        );
        Ok(())
    }
}

/// Builds and dispatches payment confirmations
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    branding: Branding,
    from: String,
    currency: String,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        branding: Branding,
        from: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            branding,
            from: from.into(),
            currency: currency.into(),
        }
    }

    pub fn confirmation_message(&self, payment: &Payment) -> EmailMessage {
        let school = &self.branding.school_name;

        let mut to = vec![payment.parent_email.clone()];
        if let Some(accounts) = &self.branding.accounts_email {
            if !accounts.eq_ignore_ascii_case(&payment.parent_email) {
                to.push(accounts.clone());
            }
        }

        let text = format!(
            "Dear Parent,\n\n\
             Your payment for {student} ({term}, {session}) was successful.\n\n\
             Amount: {amount}\n\
             Reference: {reference}\n\n\
             Thank you for choosing {school}.\n\n\
             Best regards,\n{school} Accounts Office",
            student = payment.student_name,
            term = payment.term,
            session = payment.session,
            amount = format_money(&self.currency, payment.amount),
            reference = payment.payment_reference,
        );

        EmailMessage {
            from: self.from.clone(),
            to,
            subject: format!("Payment Confirmation - {school}"),
            text,
        }
    }

    /// Fire-and-forget delivery; the handle is only useful to tests
    pub fn notify(&self, payment: &Payment) -> JoinHandle<()> {
        let message = self.confirmation_message(payment);
        let mailer = self.mailer.clone();
        let reference = payment.payment_reference.clone();

        tokio::spawn(async move {
            match mailer.send(&message).await {
                Ok(()) => tracing::info!(
                    payment_reference = %reference,
                    recipients = message.to.len(),
                    "Payment confirmation email sent"
                ),
                Err(e) => tracing::warn!(
                    payment_reference = %reference,
                    error = %e,
                    "Payment confirmation email failed"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
            Err(MailError::HttpError("connection refused".into()))
        }
    }

    fn payment() -> Payment {
        Payment {
            id: Uuid::new_v4(),
            student_name: "Ada".into(),
            student_class: "JSS 1".into(),
            session: "2024/2025".into(),
            term: "First Term".into(),
            parent_email: "ada@example.com".into(),
            amount: dec!(5000.00),
            payment_reference: "ref-123".into(),
            status: PaymentStatus::Successful,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn branding() -> Branding {
        Branding {
            school_name: "Sunshine Academy".into(),
            contact_email: None,
            accounts_email: Some("accounts@sunshine.edu".into()),
        }
    }

    #[test]
    fn confirmation_lists_payment_details() {
        let notifier = Notifier::new(
            Arc::new(LogMailer),
            branding(),
            "accounts@sunshine.edu",
            "NGN",
        );
        let message = notifier.confirmation_message(&payment());

        assert_eq!(message.subject, "Payment Confirmation - Sunshine Academy");
        assert_eq!(message.to, vec!["ada@example.com", "accounts@sunshine.edu"]);
        assert!(message
            .text
            .contains("Your payment for Ada (First Term, 2024/2025) was successful."));
        assert!(message.text.contains("Amount: NGN 5,000.00"));
        assert!(message.text.contains("Reference: ref-123"));
    }

    #[test]
    fn accounts_address_is_not_duplicated() {
        let mut p = payment();
        p.parent_email = "accounts@sunshine.edu".into();
        let notifier = Notifier::new(
            Arc::new(LogMailer),
            branding(),
            "accounts@sunshine.edu",
            "NGN",
        );
        assert_eq!(notifier.confirmation_message(&p).to.len(), 1);
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let notifier = Notifier::new(
            Arc::new(FailingMailer),
            branding(),
            "accounts@sunshine.edu",
            "NGN",
        );
        notifier.notify(&payment()).await.expect("task must not panic");
    }
}
