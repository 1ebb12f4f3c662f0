use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::Branding;
use crate::gateway::GatewayError;
use crate::models::PaymentFormInput;
use crate::receipt::ReceiptError;
use crate::repos::StoreError;
use crate::validation::ValidationError;
use crate::views;

const GENERIC_ERROR_MESSAGE: &str =
    "We could not complete your request. Please try again later.";

/// Errors surfaced by the portal's page handlers
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Invalid payment details: {0:?}")]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Payment verification failed: {0}")]
    Verification(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Receipt(ReceiptError),
}

impl From<ReceiptError> for PortalError {
    fn from(err: ReceiptError) -> Self {
        match err {
            ReceiptError::NotFound(reference) => PortalError::NotFound(reference),
            ReceiptError::Store(e) => PortalError::Store(e),
            other => PortalError::Receipt(other),
        }
    }
}

impl PortalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::Gateway(e) if e.is_provider_rejection() => StatusCode::PAYMENT_REQUIRED,
            PortalError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PortalError::Verification(_) => StatusCode::OK,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Store(_) | PortalError::Receipt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation messages in form order
    pub fn messages(errors: &[ValidationError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    /// Render the page for this error
    ///
    /// `input` is echoed back into the form when validation fails.
    pub fn into_page(
        self,
        branding: &Branding,
        currency: &str,
        input: Option<&PaymentFormInput>,
    ) -> Response {
        let status = self.status_code();

        let page = match &self {
            PortalError::Validation(errors) => views::payment_form(
                branding,
                currency,
                input.unwrap_or(&PaymentFormInput::default()),
                &Self::messages(errors),
            ),
            PortalError::Gateway(e) => {
                tracing::warn!(error = %e, status = %status, "Gateway call failed");
                views::payment_failed(branding, &e.user_message())
            }
            PortalError::Verification(reason) => {
                tracing::info!(reason = %reason, "Payment verification rejected");
                views::payment_failed(branding, reason)
            }
            PortalError::NotFound(reference) => {
                tracing::debug!(payment_reference = %reference, "Payment not found");
                views::not_found(branding, "No payment was found with that reference.")
            }
            PortalError::Store(e) => {
                tracing::error!(error = %e, "Payment store failure");
                views::error_page(branding, GENERIC_ERROR_MESSAGE)
            }
            PortalError::Receipt(e) => {
                tracing::error!(error = %e, "Receipt generation failure");
                views::error_page(branding, GENERIC_ERROR_MESSAGE)
            }
        };

        (status, page).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            PortalError::Validation(vec![ValidationError::InvalidEmail]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PortalError::Gateway(GatewayError::Rejected {
                message: "Invalid key".into()
            })
            .status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            PortalError::Gateway(GatewayError::HttpError("timeout".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PortalError::Verification("amount mismatch".into()).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            PortalError::NotFound("ref".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn receipt_not_found_becomes_portal_not_found() {
        let err: PortalError = ReceiptError::NotFound("ref-9".into()).into();
        assert!(matches!(err, PortalError::NotFound(r) if r == "ref-9"));

        let err: PortalError = ReceiptError::PdfError("boom".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
