pub mod in_memory;
pub mod payment_repo;

pub use in_memory::InMemoryPaymentStore;
pub use payment_repo::PgPaymentStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewPayment, Payment};

/// Errors that can occur during payment store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Payment reference already exists: {0}")]
    DuplicateReference(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a conditional status update
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The row moved to the requested status
    Applied(Payment),
    /// The row exists but its current status does not allow the move
    Unchanged(Payment),
    NotFound,
}

/// Persistence for payment records, keyed by the unique payment reference
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a new record with status `pending`
    async fn insert_pending(
        &self,
        new: &NewPayment,
        reference: &str,
    ) -> Result<Payment, StoreError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError>;

    /// `pending -> successful` only; other statuses are left untouched
    async fn mark_successful(&self, reference: &str) -> Result<StatusUpdate, StoreError>;

    /// `pending -> failed` only
    async fn mark_failed(&self, reference: &str) -> Result<StatusUpdate, StoreError>;

    /// Readiness probe
    async fn ping(&self) -> Result<(), StoreError>;
}
