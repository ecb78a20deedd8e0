/// Inbound email queue reader
///
/// Claims pending emails atomically and accounts for attempts. Claiming
/// flips `pending → parsing` with `FOR UPDATE SKIP LOCKED`, so multiple
/// workers never double-claim a row.
///
/// Failure handling is deliberately dumb: a failed attempt either goes back
/// to `pending` for the next poll or, once attempts are exhausted, parks at
/// `failed` until someone resets it from the dashboard. No backoff, no
/// retry schedule.

use loadline_shared::models::inbound_email::{EmailState, InboundEmail};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Queue error
#[derive(Debug, Error)]
pub enum QueueError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email not found
    #[error("Email not found: {0}")]
    EmailNotFound(Uuid),
}

/// Inbound email queue reader
pub struct EmailQueue {
    /// Database connection pool
    db: PgPool,

    /// Attempts before a row is parked at `failed`
    max_attempts: i32,
}

impl EmailQueue {
    /// Creates a queue reader
    pub fn new(db: PgPool, max_attempts: i32) -> Self {
        EmailQueue { db, max_attempts }
    }

    /// Claims pending emails for processing, oldest first
    ///
    /// Claimed rows move to `parsing` with their attempt counter bumped and
    /// `claimed_at` stamped.
    pub async fn claim_batch(&self, limit: i64) -> Result<Vec<InboundEmail>, QueueError> {
        let emails = sqlx::query_as::<_, InboundEmail>(
            r#"
            UPDATE inbound_emails
            SET state = 'parsing', attempts = attempts + 1,
                claimed_at = NOW(), updated_at = NOW()
            WHERE id IN (
                SELECT id FROM inbound_emails
                WHERE state = 'pending'
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, tenant_id, from_address, subject, body, state, attempts,
                      last_error, claimed_at, load_id, created_at, updated_at
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(emails)
    }

    /// Marks a claimed email done
    ///
    /// `matched` distinguishes "parsed into a load that hit at least one
    /// hunt plan" from "parsed, no plans hit".
    pub async fn mark_done(
        &self,
        id: Uuid,
        load_id: Uuid,
        matched: bool,
    ) -> Result<(), QueueError> {
        let state = if matched {
            EmailState::Matched
        } else {
            EmailState::Parsed
        };

        let result = sqlx::query(
            r#"
            UPDATE inbound_emails
            SET state = $2, load_id = $3, last_error = NULL, updated_at = NOW()
            WHERE id = $1 AND state = 'parsing'
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(load_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::EmailNotFound(id));
        }

        Ok(())
    }

    /// Records a failed attempt
    ///
    /// The row returns to `pending` while attempts remain, or parks at
    /// `failed` once they are exhausted. Returns the resulting state.
    pub async fn mark_failure(&self, id: Uuid, error: &str) -> Result<EmailState, QueueError> {
        let state: Option<EmailState> = sqlx::query_scalar(
            r#"
            UPDATE inbound_emails
            SET state = CASE
                    WHEN attempts >= $3 THEN 'failed'::email_state
                    ELSE 'pending'::email_state
                END,
                last_error = $2, updated_at = NOW()
            WHERE id = $1 AND state = 'parsing'
            RETURNING state
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(self.max_attempts)
        .fetch_optional(&self.db)
        .await?;

        state.ok_or(QueueError::EmailNotFound(id))
    }

    /// Counts rows parked at `failed`
    ///
    /// Logged each poll so a growing stuck pile is visible in the worker
    /// output, not just the dashboard.
    pub async fn failed_count(&self) -> Result<i64, QueueError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM inbound_emails WHERE state = 'failed'")
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }
}
