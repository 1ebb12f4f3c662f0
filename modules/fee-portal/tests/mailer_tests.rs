use fee_portal_rs::config::MailConfig;
use fee_portal_rs::notifications::{EmailMessage, HttpMailer, MailError, Mailer};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mailer(server: &MockServer) -> HttpMailer {
    HttpMailer::new(&MailConfig {
        api_url: format!("{}/v1/send", server.uri()),
        api_key: "mail_key".to_string(),
        from: "accounts@sunshine.edu".to_string(),
    })
    .unwrap()
}

fn message() -> EmailMessage {
    EmailMessage {
        from: "accounts@sunshine.edu".to_string(),
        to: vec!["ada@example.com".to_string()],
        subject: "Payment Confirmation - Sunshine Academy".to_string(),
        text: "Dear Parent".to_string(),
    }
}

#[tokio::test]
async fn test_http_mailer_posts_json_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/send"))
        .and(header("authorization", "Bearer mail_key"))
        .and(body_json(json!({
            "from": "accounts@sunshine.edu",
            "to": ["ada@example.com"],
            "subject": "Payment Confirmation - Sunshine Academy",
            "text": "Dear Parent"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    mailer(&server).send(&message()).await.unwrap();
}

#[tokio::test]
async fn test_http_mailer_reports_relay_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = mailer(&server).send(&message()).await.unwrap_err();
    assert!(matches!(
        err,
        MailError::RelayError { status_code: 401, ref message } if message == "invalid api key"
    ));
}
