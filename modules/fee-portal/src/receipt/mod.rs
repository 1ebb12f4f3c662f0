//! Downloadable PDF receipts
//!
//! A receipt is built in two steps: [`ReceiptLayout::build`] turns a payment
//! record into positioned text and a QR matrix, then [`pdf::draw`] writes that
//! layout onto an A4 page. Only the second step touches printpdf.

pub mod layout;
pub mod pdf;
pub mod qr;

pub use layout::{FontStyle, QrPlacement, ReceiptLayout, TextItem};
pub use qr::QrMatrix;

use std::sync::Arc;
use thiserror::Error;

use crate::config::Branding;
use crate::repos::{PaymentStore, StoreError};

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("No payment found with reference {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("QR encoding failed: {0}")]
    QrError(String),

    #[error("PDF generation failed: {0}")]
    PdfError(String),
}

/// Renders receipts for stored payments
#[derive(Clone)]
pub struct ReceiptRenderer {
    store: Arc<dyn PaymentStore>,
    branding: Branding,
    currency: String,
    public_base_url: String,
}

impl ReceiptRenderer {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        branding: Branding,
        currency: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            branding,
            currency: currency.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Layout for the payment with this reference
    pub async fn layout(&self, reference: &str) -> Result<ReceiptLayout, ReceiptError> {
        let payment = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ReceiptError::NotFound(reference.to_string()))?;

        ReceiptLayout::build(&payment, &self.branding, &self.currency, &self.public_base_url)
    }

    /// PDF bytes for the payment with this reference
    pub async fn render(&self, reference: &str) -> Result<Vec<u8>, ReceiptError> {
        let layout = self.layout(reference).await?;
        let bytes = pdf::draw(&layout)?;

        tracing::debug!(
            payment_reference = %reference,
            size_bytes = bytes.len(),
            "Receipt rendered"
        );
        Ok(bytes)
    }
}

/// `Receipt_{reference}.pdf`
pub fn receipt_filename(reference: &str) -> String {
    format!("Receipt_{reference}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPayment;
    use crate::repos::InMemoryPaymentStore;
    use rust_decimal_macros::dec;

    async fn renderer_with_payment() -> ReceiptRenderer {
        let store = InMemoryPaymentStore::new();
        store
            .insert_pending(
                &NewPayment {
                    student_name: "Ada".into(),
                    student_class: "JSS 1".into(),
                    session: "2024/2025".into(),
                    term: "First Term".into(),
                    parent_email: "ada@example.com".into(),
                    amount: dec!(5000.00),
                },
                "ref-123",
            )
            .await
            .unwrap();

        ReceiptRenderer::new(
            Arc::new(store),
            Branding::default(),
            "NGN",
            "https://fees.example.com/",
        )
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let renderer = renderer_with_payment().await;
        let err = renderer.render("missing").await.unwrap_err();
        assert!(matches!(err, ReceiptError::NotFound(r) if r == "missing"));
    }

    #[tokio::test]
    async fn layout_is_deterministic() {
        let renderer = renderer_with_payment().await;
        let first = renderer.layout("ref-123").await.unwrap();
        let second = renderer.layout("ref-123").await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains_text("Ada"));
        assert!(first.contains_text("NGN 5,000.00"));
    }

    #[tokio::test]
    async fn renders_a_pdf_document() {
        let renderer = renderer_with_payment().await;
        let bytes = renderer.render("ref-123").await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn filename_uses_reference() {
        assert_eq!(receipt_filename("ref-123"), "Receipt_ref-123.pdf");
    }
}
