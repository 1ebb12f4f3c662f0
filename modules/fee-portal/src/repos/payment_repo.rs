use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PaymentStore, StatusUpdate, StoreError};
use crate::models::{NewPayment, Payment};

/// Postgres-backed payment store
#[derive(Clone)]
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn resolve_unchanged(&self, reference: &str) -> Result<StatusUpdate, StoreError> {
        Ok(match self.find_by_reference(reference).await? {
            Some(payment) => StatusUpdate::Unchanged(payment),
            None => StatusUpdate::NotFound,
        })
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert_pending(
        &self,
        new: &NewPayment,
        reference: &str,
    ) -> Result<Payment, StoreError> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO fee_payments (
                id, student_name, student_class, session, term,
                parent_email, amount, payment_reference, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', NOW(), NOW())
            RETURNING
                id, student_name, student_class, session, term,
                parent_email, amount, payment_reference, status,
                created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.student_name)
        .bind(&new.student_class)
        .bind(&new.session)
        .bind(&new.term)
        .bind(&new.parent_email)
        .bind(new.amount)
        .bind(reference)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
                    return StoreError::DuplicateReference(reference.to_string());
                }
            }
            StoreError::Database(e)
        })
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, student_name, student_class, session, term,
                parent_email, amount, payment_reference, status,
                created_at, updated_at
            FROM fee_payments
            WHERE payment_reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn mark_successful(&self, reference: &str) -> Result<StatusUpdate, StoreError> {
        // Conditional update: concurrent verifications of the same reference
        // see exactly one Applied.
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE fee_payments
            SET status = 'successful', updated_at = NOW()
            WHERE payment_reference = $1 AND status = 'pending'
            RETURNING
                id, student_name, student_class, session, term,
                parent_email, amount, payment_reference, status,
                created_at, updated_at
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(payment) => Ok(StatusUpdate::Applied(payment)),
            None => self.resolve_unchanged(reference).await,
        }
    }

    async fn mark_failed(&self, reference: &str) -> Result<StatusUpdate, StoreError> {
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE fee_payments
            SET status = 'failed', updated_at = NOW()
            WHERE payment_reference = $1 AND status = 'pending'
            RETURNING
                id, student_name, student_class, session, term,
                parent_email, amount, payment_reference, status,
                created_at, updated_at
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(payment) => Ok(StatusUpdate::Applied(payment)),
            None => self.resolve_unchanged(reference).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
