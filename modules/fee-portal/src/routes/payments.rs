use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;

use super::AppState;
use crate::error::PortalError;
use crate::models::{PaymentFormInput, VerifyQuery};
use crate::validation::validate_payment_form;
use crate::views;

pub async fn payment_form(State(state): State<Arc<AppState>>) -> Html<String> {
    views::payment_form(
        &state.branding,
        state.payments.currency(),
        &PaymentFormInput::default(),
        &[],
    )
}

/// POST /pay/ - validate and show the confirmation step; nothing is stored yet
pub async fn review_payment(
    State(state): State<Arc<AppState>>,
    Form(input): Form<PaymentFormInput>,
) -> Response {
    let currency = state.payments.currency();
    match validate_payment_form(&input) {
        Ok(payment) => views::payment_confirm(&state.branding, currency, &payment).into_response(),
        Err(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            views::payment_form(
                &state.branding,
                currency,
                &input,
                &PortalError::messages(&errors),
            ),
        )
            .into_response(),
    }
}

/// POST /initialize/ - record the payment and hand the parent to the gateway
pub async fn initialize_payment(
    State(state): State<Arc<AppState>>,
    Form(input): Form<PaymentFormInput>,
) -> Response {
    match state.payments.initialize_payment(&input).await {
        Ok(initialized) => {
            tracing::info!(
                payment_reference = %initialized.payment.payment_reference,
                "Redirecting to gateway checkout"
            );
            Redirect::to(&initialized.authorization_url).into_response()
        }
        Err(e) => e.into_page(&state.branding, state.payments.currency(), Some(&input)),
    }
}

/// GET /verify/ - gateway callback
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match state.payments.verify_payment(&query).await {
        Ok(verified) => {
            tracing::debug!(
                payment_reference = %verified.payment.payment_reference,
                newly_confirmed = verified.newly_confirmed,
                "Rendering payment success"
            );
            views::payment_success(&state.branding, state.payments.currency(), &verified.payment)
                .into_response()
        }
        Err(e) => e.into_page(&state.branding, state.payments.currency(), None),
    }
}
