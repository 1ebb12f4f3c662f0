use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{PaymentStore, StatusUpdate, StoreError};
use crate::models::{NewPayment, Payment, PaymentStatus};

/// A thread-safe in-memory payment store.
///
/// Keyed by payment reference. Used for local development
/// (`STORE_TYPE=inmemory`) and tests; nothing survives a restart.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<String, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, oldest first
    pub async fn all(&self) -> Vec<Payment> {
        let payments = self.payments.read().await;
        let mut all: Vec<Payment> = payments.values().cloned().collect();
        all.sort_by_key(|p| p.created_at);
        all
    }

    async fn transition(
        &self,
        reference: &str,
        to: PaymentStatus,
        allowed_from: &[PaymentStatus],
    ) -> StatusUpdate {
        let mut payments = self.payments.write().await;
        match payments.get_mut(reference) {
            None => StatusUpdate::NotFound,
            Some(payment) if allowed_from.contains(&payment.status) => {
                payment.status = to;
                payment.updated_at = Utc::now();
                StatusUpdate::Applied(payment.clone())
            }
            Some(payment) => StatusUpdate::Unchanged(payment.clone()),
        }
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert_pending(
        &self,
        new: &NewPayment,
        reference: &str,
    ) -> Result<Payment, StoreError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(reference) {
            return Err(StoreError::DuplicateReference(reference.to_string()));
        }
        let payment = Payment::pending(new, reference, Utc::now());
        payments.insert(reference.to_string(), payment.clone());
        Ok(payment)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let payments = self.payments.read().await;
        Ok(payments.get(reference).cloned())
    }

    async fn mark_successful(&self, reference: &str) -> Result<StatusUpdate, StoreError> {
        Ok(self
            .transition(reference, PaymentStatus::Successful, &[PaymentStatus::Pending])
            .await)
    }

    async fn mark_failed(&self, reference: &str) -> Result<StatusUpdate, StoreError> {
        Ok(self
            .transition(reference, PaymentStatus::Failed, &[PaymentStatus::Pending])
            .await)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
