use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fee_portal_rs::config::{Config, StoreType};
use fee_portal_rs::notifications::{HttpMailer, LogMailer, Mailer, Notifier};
use fee_portal_rs::receipt::ReceiptRenderer;
use fee_portal_rs::repos::{InMemoryPaymentStore, PaymentStore, PgPaymentStore};
use fee_portal_rs::services::PaymentService;
use fee_portal_rs::{db, gateway, portal_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fee_portal_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cfg = Config::from_env()?;
    tracing::info!(
        store = ?cfg.store_type,
        provider = %cfg.gateway.provider,
        currency = %cfg.currency,
        "config loaded"
    );

    let store: Arc<dyn PaymentStore> = match cfg.store_type {
        StoreType::Postgres => {
            let database_url = cfg
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set when STORE_TYPE=postgres")?;
            let pool = db::init_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("db connected + migrations applied");
            Arc::new(PgPaymentStore::new(pool))
        }
        StoreType::InMemory => {
            tracing::warn!("Using in-memory payment store; records are lost on restart");
            Arc::new(InMemoryPaymentStore::new())
        }
    };

    let gateway = gateway::build_gateway(cfg.gateway.clone())?;

    let (mailer, from): (Arc<dyn Mailer>, String) = match &cfg.mail {
        Some(mail) => (Arc::new(HttpMailer::new(mail)?), mail.from.clone()),
        None => {
            tracing::info!("MAIL_API_URL not set; confirmation emails will only be logged");
            let from = cfg
                .branding
                .accounts_email
                .clone()
                .unwrap_or_else(|| "no-reply@localhost".to_string());
            (Arc::new(LogMailer), from)
        }
    };
    let notifier = Notifier::new(mailer, cfg.branding.clone(), from, cfg.currency.clone());

    let payments = PaymentService::new(
        store.clone(),
        gateway,
        notifier,
        cfg.callback_url(),
        cfg.currency.clone(),
    );
    let receipts = ReceiptRenderer::new(
        store.clone(),
        cfg.branding.clone(),
        cfg.currency.clone(),
        cfg.public_base_url.clone(),
    );

    let state = Arc::new(AppState {
        payments,
        receipts,
        store,
        branding: cfg.branding.clone(),
    });

    let app = portal_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "fee portal listening");
    axum::serve(listener, app).await?;

    Ok(())
}
