pub mod health;
pub mod pages;
pub mod payments;
pub mod receipt;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::Branding;
use crate::receipt::ReceiptRenderer;
use crate::repos::PaymentStore;
use crate::services::PaymentService;

/// Shared state for every portal handler
#[derive(Clone)]
pub struct AppState {
    pub payments: PaymentService,
    pub receipts: ReceiptRenderer,
    pub store: Arc<dyn PaymentStore>,
    pub branding: Branding,
}

pub fn portal_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route(
            "/pay/",
            get(payments::payment_form).post(payments::review_payment),
        )
        .route("/initialize/", post(payments::initialize_payment))
        .route("/verify/", get(payments::verify_payment))
        .route("/receipt/{reference}/", get(receipt::download_receipt))
        .route("/about/", get(pages::about))
        .route("/contact/", get(pages::contact))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        .fallback(pages::not_found)
        .with_state(state)
}
