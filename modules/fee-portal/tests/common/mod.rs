#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fee_portal_rs::config::Branding;
use fee_portal_rs::gateway::{
    Checkout, GatewayError, GatewayProvider, GatewayTransactionStatus, InitializeRequest,
    PaymentGateway, VerifiedTransaction, VerifyTarget,
};
use fee_portal_rs::notifications::{EmailMessage, MailError, Mailer, Notifier};
use fee_portal_rs::receipt::ReceiptRenderer;
use fee_portal_rs::repos::{InMemoryPaymentStore, PaymentStore};
use fee_portal_rs::services::PaymentService;
use fee_portal_rs::{portal_router, AppState};

pub const CHECKOUT_BASE: &str = "https://checkout.example.com/pay";
pub const PUBLIC_BASE_URL: &str = "http://portal.test";

/// How the fake gateway answers initialize calls
#[derive(Debug, Clone)]
pub enum InitializeBehaviour {
    Checkout,
    Reject(String),
    Unreachable,
}

/// In-process gateway: remembers what was asked and answers from a table of
/// settled transactions keyed by reference.
pub struct FakeGateway {
    pub initialize_behaviour: Mutex<InitializeBehaviour>,
    pub verify_unreachable: Mutex<bool>,
    pub initialized: Mutex<Vec<InitializeRequest>>,
    pub verified: Mutex<Vec<VerifyTarget>>,
    transactions: Mutex<HashMap<String, VerifiedTransaction>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            initialize_behaviour: Mutex::new(InitializeBehaviour::Checkout),
            verify_unreachable: Mutex::new(false),
            initialized: Mutex::new(Vec::new()),
            verified: Mutex::new(Vec::new()),
            transactions: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_initialize(&self, behaviour: InitializeBehaviour) {
        *self.initialize_behaviour.lock().unwrap() = behaviour;
    }

    pub fn set_verify_unreachable(&self, unreachable: bool) {
        *self.verify_unreachable.lock().unwrap() = unreachable;
    }

    /// Record the provider-side outcome for a reference
    pub fn settle(&self, reference: &str, status: GatewayTransactionStatus, amount: Decimal) {
        let mut transactions = self.transactions.lock().unwrap();
        let transaction_id = format!("tx-{}", transactions.len() + 1);
        transactions.insert(
            reference.to_string(),
            VerifiedTransaction {
                transaction_id: Some(transaction_id),
                reference: Some(reference.to_string()),
                status,
                amount,
                currency: Some("NGN".to_string()),
                payer_email: None,
                message: match status {
                    GatewayTransactionStatus::Success => Some("Approved".to_string()),
                    GatewayTransactionStatus::Failed => Some("Declined".to_string()),
                    GatewayTransactionStatus::Pending => None,
                },
            },
        );
    }

    /// Register a transaction whose fields are fully controlled by the test
    pub fn insert_transaction(&self, key: &str, transaction: VerifiedTransaction) {
        self.transactions
            .lock()
            .unwrap()
            .insert(key.to_string(), transaction);
    }

    pub fn transaction_id_for(&self, reference: &str) -> Option<String> {
        self.transactions
            .lock()
            .unwrap()
            .get(reference)
            .and_then(|t| t.transaction_id.clone())
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialized.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider(&self) -> GatewayProvider {
        GatewayProvider::Paystack
    }

    async fn initialize(&self, request: &InitializeRequest) -> Result<Checkout, GatewayError> {
        self.initialized.lock().unwrap().push(request.clone());
        let behaviour = self.initialize_behaviour.lock().unwrap().clone();
        match behaviour {
            InitializeBehaviour::Checkout => Ok(Checkout {
                authorization_url: format!("{CHECKOUT_BASE}/{}", request.reference),
                reference: request.reference.clone(),
            }),
            InitializeBehaviour::Reject(message) => Err(GatewayError::Rejected { message }),
            InitializeBehaviour::Unreachable => {
                Err(GatewayError::HttpError("connection refused".to_string()))
            }
        }
    }

    async fn verify(&self, target: &VerifyTarget) -> Result<VerifiedTransaction, GatewayError> {
        self.verified.lock().unwrap().push(target.clone());
        if *self.verify_unreachable.lock().unwrap() {
            return Err(GatewayError::HttpError("operation timed out".to_string()));
        }

        let transactions = self.transactions.lock().unwrap();
        let found = match target {
            VerifyTarget::Reference(reference) => transactions.get(reference).cloned(),
            VerifyTarget::TransactionId(id) => transactions
                .values()
                .find(|t| t.transaction_id.as_deref() == Some(id.as_str()))
                .cloned(),
        };
        found.ok_or_else(|| GatewayError::Rejected {
            message: "Transaction reference not found".to_string(),
        })
    }
}

/// Mailer that keeps every message in memory
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryPaymentStore,
    pub gateway: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub receipts: ReceiptRenderer,
}

pub fn branding() -> Branding {
    Branding {
        school_name: "Sunshine Academy".to_string(),
        contact_email: Some("office@sunshine.edu".to_string()),
        accounts_email: Some("accounts@sunshine.edu".to_string()),
    }
}

/// Full portal wired to the in-memory store, fake gateway and recording mailer
pub fn test_app() -> TestApp {
    let store = InMemoryPaymentStore::new();
    let shared_store: Arc<dyn PaymentStore> = Arc::new(store.clone());
    let gateway = Arc::new(FakeGateway::new());
    let mailer = Arc::new(RecordingMailer::default());

    let notifier = Notifier::new(mailer.clone(), branding(), "accounts@sunshine.edu", "NGN");
    let payments = PaymentService::new(
        shared_store.clone(),
        gateway.clone(),
        notifier,
        format!("{PUBLIC_BASE_URL}/verify/"),
        "NGN",
    );
    let receipts = ReceiptRenderer::new(shared_store.clone(), branding(), "NGN", PUBLIC_BASE_URL);

    let state = Arc::new(AppState {
        payments,
        receipts: receipts.clone(),
        store: shared_store,
        branding: branding(),
    });

    TestApp {
        router: portal_router(state),
        store,
        gateway,
        mailer,
        receipts,
    }
}

pub fn form_body(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).expect("form fields should encode")
}

pub fn ada_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("student_name", "Ada"),
        ("student_class", "JSS 1"),
        ("session", "2024/2025"),
        ("term", "First Term"),
        ("parent_email", "ada@example.com"),
        ("amount", "5000.00"),
    ]
}

pub fn post_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form_body(fields)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get("location")
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Read response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Read response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Confirmation emails are sent from a spawned task; give it a moment.
pub async fn wait_for_mail(mailer: &RecordingMailer, expected: usize) {
    for _ in 0..100 {
        if mailer.count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connect to the test database and run migrations.
pub async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL_FEES")
        .expect("DATABASE_URL_FEES must be set for database tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn unique_reference() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}
