//! Validation logic for fee payment submissions
//!
//! Every rule is checked so the form can show all problems at once; nothing is
//! persisted unless the whole submission is valid.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{NewPayment, PaymentFormInput};

const MAX_STUDENT_NAME: usize = 255;
const MAX_STUDENT_CLASS: usize = 100;
const MAX_SESSION: usize = 20;
const MAX_TERM: usize = 20;
const MAX_EMAIL: usize = 254;

/// Exclusive upper bound imposed by NUMERIC(10, 2)
const AMOUNT_LIMIT: i64 = 100_000_000;

/// Validation errors for fee payment submissions
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Parent email is not a valid email address")]
    InvalidEmail,

    #[error("Amount must be a number, got '{0}'")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Amount cannot have more than 2 decimal places")]
    TooManyDecimalPlaces,

    #[error("Amount cannot exceed 99,999,999.99")]
    AmountTooLarge,
}

/// Validate a raw form submission
///
/// # Validation Rules
///
/// - `student_name`, `student_class`, `session`, `term`: required, trimmed,
///   bounded by their column widths
/// - `parent_email`: required, syntactically valid
/// - `amount`: positive decimal, at most 2 decimal places, thousands
///   separators allowed
///
/// # Errors
///
/// Returns every violated rule, in form order
pub fn validate_payment_form(input: &PaymentFormInput) -> Result<NewPayment, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let student_name = required_text(
        &input.student_name,
        "Student name",
        MAX_STUDENT_NAME,
        &mut errors,
    );
    let student_class = required_text(
        &input.student_class,
        "Student class",
        MAX_STUDENT_CLASS,
        &mut errors,
    );
    let session = required_text(&input.session, "Academic session", MAX_SESSION, &mut errors);
    let term = required_text(&input.term, "Term", MAX_TERM, &mut errors);

    let parent_email = required_text(&input.parent_email, "Parent email", MAX_EMAIL, &mut errors);
    if let Some(email) = &parent_email {
        if !is_valid_email(email) {
            errors.push(ValidationError::InvalidEmail);
        }
    }

    let amount = match input.amount.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(ValidationError::Missing("Amount"));
            None
        }
        Some(raw) => match parse_amount(raw) {
            Ok(amount) => Some(amount),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    match (student_name, student_class, session, term, parent_email, amount) {
        (
            Some(student_name),
            Some(student_class),
            Some(session),
            Some(term),
            Some(parent_email),
            Some(amount),
        ) => Ok(NewPayment {
            student_name,
            student_class,
            session,
            term,
            parent_email: parent_email.to_lowercase(),
            amount,
        }),
        _ => Err(vec![ValidationError::Missing("Payment details")]),
    }
}

fn required_text(
    value: &Option<String>,
    field: &'static str,
    max: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push(ValidationError::Missing(field));
        return None;
    }
    if trimmed.chars().count() > max {
        errors.push(ValidationError::TooLong { field, max });
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a user-entered amount into a 2dp decimal
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let mut amount = Decimal::from_str(&cleaned)
        .map_err(|_| ValidationError::InvalidAmount(raw.trim().to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::TooManyDecimalPlaces);
    }
    if amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err(ValidationError::AmountTooLarge);
    }

    amount.rescale(2);
    Ok(amount)
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain of
/// alphanumeric/hyphen labels, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}
