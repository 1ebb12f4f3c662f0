//! Server-rendered HTML pages
//!
//! Templates are compiled into the binary and use `{{key}}` placeholders.
//! Every user-supplied value is escaped before substitution.

use axum::response::Html;

use crate::config::Branding;
use crate::models::{format_money, NewPayment, Payment, PaymentFormInput};

const BASE: &str = include_str!("../templates/base.html");
const PAYMENT_FORM: &str = include_str!("../templates/payment_form.html");
const PAYMENT_CONFIRM: &str = include_str!("../templates/payment_confirm.html");
const PAYMENT_SUCCESS: &str = include_str!("../templates/payment_success.html");
const PAYMENT_FAILED: &str = include_str!("../templates/payment_failed.html");
const ABOUT: &str = include_str!("../templates/about.html");
const CONTACT: &str = include_str!("../templates/contact.html");
const NOT_FOUND: &str = include_str!("../templates/not_found.html");
const ERROR: &str = include_str!("../templates/error.html");

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Substitute `{{key}}` placeholders in one pass; unknown keys are left as is
fn fill(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn page(branding: &Branding, title: &str, content: &str) -> Html<String> {
    Html(fill(
        BASE,
        &[
            ("title", escape_html(title)),
            ("school_name", escape_html(&branding.school_name)),
            ("content", content.to_string()),
        ],
    ))
}

fn field(value: &Option<String>) -> String {
    escape_html(value.as_deref().unwrap_or_default())
}

pub fn payment_form(
    branding: &Branding,
    currency: &str,
    input: &PaymentFormInput,
    errors: &[String],
) -> Html<String> {
    let errors_html = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!("<ul class=\"errors\">{items}</ul>")
    };

    let content = fill(
        PAYMENT_FORM,
        &[
            ("errors", errors_html),
            ("student_name", field(&input.student_name)),
            ("student_class", field(&input.student_class)),
            ("session", field(&input.session)),
            ("term", field(&input.term)),
            ("parent_email", field(&input.parent_email)),
            ("amount", field(&input.amount)),
            ("currency", escape_html(currency)),
        ],
    );
    page(branding, "Pay School Fees", &content)
}

/// Review page; hidden fields carry the normalised values to `/initialize/`
pub fn payment_confirm(branding: &Branding, currency: &str, payment: &NewPayment) -> Html<String> {
    let content = fill(
        PAYMENT_CONFIRM,
        &[
            ("student_name", escape_html(&payment.student_name)),
            ("student_class", escape_html(&payment.student_class)),
            ("session", escape_html(&payment.session)),
            ("term", escape_html(&payment.term)),
            ("parent_email", escape_html(&payment.parent_email)),
            ("amount", payment.amount.to_string()),
            ("amount_display", escape_html(&format_money(currency, payment.amount))),
        ],
    );
    page(branding, "Confirm Payment", &content)
}

pub fn payment_success(branding: &Branding, currency: &str, payment: &Payment) -> Html<String> {
    let content = fill(
        PAYMENT_SUCCESS,
        &[
            ("student_name", escape_html(&payment.student_name)),
            ("student_class", escape_html(&payment.student_class)),
            ("session", escape_html(&payment.session)),
            ("term", escape_html(&payment.term)),
            ("amount", escape_html(&format_money(currency, payment.amount))),
            ("reference", escape_html(&payment.payment_reference)),
            ("status", payment.status.label().to_string()),
        ],
    );
    page(branding, "Payment Successful", &content)
}

pub fn payment_failed(branding: &Branding, message: &str) -> Html<String> {
    let content = fill(PAYMENT_FAILED, &[("message", escape_html(message))]);
    page(branding, "Payment Failed", &content)
}

pub fn about(branding: &Branding) -> Html<String> {
    let content = fill(ABOUT, &[("school_name", escape_html(&branding.school_name))]);
    page(branding, "About", &content)
}

pub fn contact(branding: &Branding) -> Html<String> {
    let contact = match &branding.contact_email {
        Some(email) => {
            let email = escape_html(email);
            format!("<p>Email: <a href=\"mailto:{email}\">{email}</a></p>")
        }
        None => String::new(),
    };
    let content = fill(
        CONTACT,
        &[
            ("school_name", escape_html(&branding.school_name)),
            ("contact", contact),
        ],
    );
    page(branding, "Contact", &content)
}

pub fn not_found(branding: &Branding, message: &str) -> Html<String> {
    let content = fill(NOT_FOUND, &[("message", escape_html(message))]);
    page(branding, "Not Found", &content)
}

pub fn error_page(branding: &Branding, message: &str) -> Html<String> {
    let content = fill(ERROR, &[("message", escape_html(message))]);
    page(branding, "Error", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn fill_is_single_pass() {
        let out = fill(
            "{{a}} {{b}} {{missing}}",
            &[("a", "{{b}}".to_string()), ("b", "2".to_string())],
        );
        assert_eq!(out, "{{b}} 2 {{missing}}");
    }

    #[test]
    fn form_keeps_input_and_lists_errors() {
        let input = PaymentFormInput {
            student_name: Some("<b>Ada</b>".into()),
            ..Default::default()
        };
        let Html(body) = payment_form(
            &Branding::default(),
            "NGN",
            &input,
            &["Term is required".to_string()],
        );

        assert!(body.contains("value=\"&lt;b&gt;Ada&lt;/b&gt;\""));
        assert!(body.contains("<li>Term is required</li>"));
        assert!(body.contains("Sunshine Academy"));
        assert!(!body.contains("{{"));
    }

    #[test]
    fn confirm_page_posts_to_initialize() {
        let new = NewPayment {
            student_name: "Ada".into(),
            student_class: "JSS 1".into(),
            session: "2024/2025".into(),
            term: "First Term".into(),
            parent_email: "ada@example.com".into(),
            amount: dec!(5000.00),
        };
        let Html(body) = payment_confirm(&Branding::default(), "NGN", &new);

        assert!(body.contains("action=\"/initialize/\""));
        assert!(body.contains("name=\"amount\" value=\"5000.00\""));
        assert!(body.contains("NGN 5,000.00"));
    }

    #[test]
    fn contact_shows_configured_email() {
        let branding = Branding {
            contact_email: Some("office@sunshine.edu".into()),
            ..Default::default()
        };
        let Html(body) = contact(&branding);
        assert!(body.contains("mailto:office@sunshine.edu"));
    }
}
