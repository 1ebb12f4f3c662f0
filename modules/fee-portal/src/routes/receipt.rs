use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::error::PortalError;
use crate::receipt::receipt_filename;

/// GET /receipt/{reference}/ - PDF download
pub async fn download_receipt(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Response {
    match state.receipts.render(&reference).await {
        Ok(pdf) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", receipt_filename(&reference)),
                ),
            ],
            pdf,
        )
            .into_response(),
        Err(e) => PortalError::from(e).into_page(&state.branding, state.payments.currency(), None),
    }
}
