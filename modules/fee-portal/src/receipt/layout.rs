use super::{QrMatrix, ReceiptError};
use crate::config::Branding;
use crate::models::{format_money, Payment};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

const HEADER_Y: f32 = 268.8;
const SUBTITLE_Y: f32 = 261.7;
const TABLE_TOP_Y: f32 = 240.6;
const ROW_STEP: f32 = 8.8;
const LABEL_X: f32 = 28.2;
const VALUE_X: f32 = 77.6;
const FOOTER_Y: f32 = 28.2;

const QR_X: f32 = 139.4;
const QR_Y: f32 = 208.8;
const QR_SIZE: f32 = 35.3;

pub const FOOTER_TEXT: &str = "This is a system-generated receipt. No signature required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// A single line of text; coordinates are the baseline origin in mm from the
/// bottom-left corner of the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub style: FontStyle,
}

/// QR code square; `(x_mm, y_mm)` is its bottom-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct QrPlacement {
    pub matrix: QrMatrix,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_mm: f32,
}

impl QrPlacement {
    pub fn module_size_mm(&self) -> f32 {
        self.size_mm / self.matrix.width() as f32
    }
}

/// Everything drawn on a receipt page
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLayout {
    pub title: String,
    pub items: Vec<TextItem>,
    pub qr: QrPlacement,
}

impl ReceiptLayout {
    pub fn build(
        payment: &Payment,
        branding: &Branding,
        currency: &str,
        public_base_url: &str,
    ) -> Result<Self, ReceiptError> {
        let amount = format_money(currency, payment.amount);
        let mut items = vec![
            centered(&branding.school_name, HEADER_Y, 18.0, FontStyle::Bold),
            centered("Official Payment Receipt", SUBTITLE_Y, 12.0, FontStyle::Regular),
        ];

        let rows = [
            ("Student Name", payment.student_name.clone()),
            ("Academic Session", payment.session.clone()),
            ("Class", payment.student_class.clone()),
            ("Term", payment.term.clone()),
            ("Parent Email", payment.parent_email.clone()),
            ("Amount Paid", amount.clone()),
            ("Payment Reference", payment.payment_reference.clone()),
            ("Status", payment.status.label().to_string()),
            ("Date", payment.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ];

        for (i, (label, value)) in rows.into_iter().enumerate() {
            let y = TABLE_TOP_Y - ROW_STEP * i as f32;
            items.push(TextItem {
                text: format!("{label}:"),
                x_mm: LABEL_X,
                y_mm: y,
                size_pt: 11.0,
                style: FontStyle::Bold,
            });
            items.push(TextItem {
                text: value,
                x_mm: VALUE_X,
                y_mm: y,
                size_pt: 11.0,
                style: FontStyle::Regular,
            });
        }

        items.push(centered(FOOTER_TEXT, FOOTER_Y, 9.0, FontStyle::Italic));

        let payload = format!(
            "Payment Reference: {reference}\nStatus: {status}\nAmount: {amount}\n\
             Verify: {base}/receipt/{reference}/",
            reference = payment.payment_reference,
            status = payment.status.label(),
            base = public_base_url.trim_end_matches('/'),
        );

        Ok(ReceiptLayout {
            title: format!("Receipt {}", payment.payment_reference),
            items,
            qr: QrPlacement {
                matrix: QrMatrix::encode(&payload)?,
                x_mm: QR_X,
                y_mm: QR_Y,
                size_mm: QR_SIZE,
            },
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.items.iter().any(|item| item.text.contains(needle))
    }
}

fn approximate_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * AVG_GLYPH_WIDTH * PT_TO_MM
}

fn centered(text: &str, y_mm: f32, size_pt: f32, style: FontStyle) -> TextItem {
    let width = approximate_width_mm(text, size_pt);
    TextItem {
        text: text.to_string(),
        x_mm: ((PAGE_WIDTH_MM - width) / 2.0).max(0.0),
        y_mm,
        size_pt,
        style,
    }
}
