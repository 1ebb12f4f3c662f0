use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::gateway::VerifyTarget;

/// Payment status enum matching database fee_payment_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fee_payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    /// Human-facing label used on pages, receipts and emails
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Successful => "Successful",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment record from fee_payments table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub student_name: String,
    pub student_class: String,
    pub session: String,
    pub term: String,
    pub parent_email: String,
    pub amount: Decimal,
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Build a fresh pending record for a validated submission
    pub fn pending(new: &NewPayment, reference: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_name: new.student_name.clone(),
            student_class: new.student_class.clone(),
            session: new.session.clone(),
            term: new.term.clone(),
            parent_email: new.parent_email.clone(),
            amount: new.amount,
            payment_reference: reference.to_string(),
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated fee submission, ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub student_name: String,
    pub student_class: String,
    pub session: String,
    pub term: String,
    pub parent_email: String,
    pub amount: Decimal,
}

/// Raw form body for `/pay/` and `/initialize/`
///
/// Every field is optional so that a missing field surfaces as a validation
/// message rather than a rejected request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFormInput {
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_class: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub parent_email: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

/// Query parameters the gateway appends when redirecting back to `/verify/`
///
/// Paystack sends `reference` and `trxref`; Flutterwave sends `tx_ref`,
/// `transaction_id` and `status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub trxref: Option<String>,
    pub tx_ref: Option<String>,
    pub status: Option<String>,
}

impl VerifyQuery {
    /// The payment reference the callback claims to be for, if any
    pub fn claimed_reference(&self) -> Option<&str> {
        [&self.reference, &self.trxref, &self.tx_ref]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// What to ask the gateway about: the transaction id when present,
    /// otherwise the claimed reference.
    pub fn target(&self) -> Option<VerifyTarget> {
        let transaction_id = self
            .transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (transaction_id, self.claimed_reference()) {
            (Some(id), _) => Some(VerifyTarget::TransactionId(id.to_string())),
            (None, Some(reference)) => Some(VerifyTarget::Reference(reference.to_string())),
            (None, None) => None,
        }
    }
}

/// Format an amount with thousands separators and two decimal places,
/// e.g. `5000` -> `5,000.00`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac}")
}

/// Amount prefixed by its currency code, e.g. `NGN 5,000.00`
pub fn format_money(currency: &str, amount: Decimal) -> String {
    format!("{} {}", currency, format_amount(amount))
}
