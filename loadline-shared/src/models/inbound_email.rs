/// Inbound email queue model
///
/// Broker emails land here via the ingestion webhook and are drained by the
/// worker. Rows that keep failing stop at `failed` with their attempt count
/// and last error intact; recovery is a person pressing reset on the queue
/// dashboard, not a retry loop.
///
/// # State Machine
///
/// ```text
/// pending → parsing → parsed | matched
///                   → failed      (attempts exhausted)
/// failed  → pending               (manual reset)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE email_state AS ENUM ('pending', 'parsing', 'parsed', 'matched', 'failed');
///
/// CREATE TABLE inbound_emails (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     from_address VARCHAR(255) NOT NULL,
///     subject TEXT NOT NULL DEFAULT '',
///     body TEXT NOT NULL DEFAULT '',
///     state email_state NOT NULL DEFAULT 'pending',
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     claimed_at TIMESTAMPTZ,
///     load_id UUID REFERENCES loads(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::tenancy::TenantScope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Processing state of an inbound email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "email_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailState {
    /// Queued, waiting for the worker
    Pending,

    /// Claimed by a worker
    Parsing,

    /// Parsed into a load, no hunt plans hit
    Parsed,

    /// Parsed into a load with at least one hunt match
    Matched,

    /// Attempts exhausted; waiting for manual reset
    Failed,
}

impl EmailState {
    /// Converts state to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailState::Pending => "pending",
            EmailState::Parsing => "parsing",
            EmailState::Parsed => "parsed",
            EmailState::Matched => "matched",
            EmailState::Failed => "failed",
        }
    }

    /// Checks if state is terminal for the worker
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmailState::Parsed | EmailState::Matched | EmailState::Failed
        )
    }
}

/// Inbound email queue row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InboundEmail {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub from_address: String,
    pub subject: String,
    pub body: String,
    pub state: EmailState,

    /// Processing attempts so far
    pub attempts: i32,

    /// Error from the most recent failed attempt
    pub last_error: Option<String>,

    /// When a worker last claimed this row
    pub claimed_at: Option<DateTime<Utc>>,

    /// Load created from this email, once parsed
    pub load_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for enqueuing an inbound email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInboundEmail {
    pub from_address: String,
    pub subject: String,
    pub body: String,
}

impl InboundEmail {
    /// Enqueues an email for processing
    pub async fn enqueue(
        pool: &PgPool,
        scope: TenantScope,
        data: CreateInboundEmail,
    ) -> Result<Self, sqlx::Error> {
        let email = sqlx::query_as::<_, InboundEmail>(
            r#"
            INSERT INTO inbound_emails (tenant_id, from_address, subject, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, from_address, subject, body, state, attempts,
                      last_error, claimed_at, load_id, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(data.from_address)
        .bind(data.subject)
        .bind(data.body)
        .fetch_one(pool)
        .await?;

        Ok(email)
    }

    /// Finds a queue row by ID within the scoped tenant
    pub async fn find_by_id(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let email = sqlx::query_as::<_, InboundEmail>(
            r#"
            SELECT id, tenant_id, from_address, subject, body, state, attempts,
                   last_error, claimed_at, load_id, created_at, updated_at
            FROM inbound_emails
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(email)
    }

    /// Lists queue rows in the scoped tenant, optionally filtered by state,
    /// newest first
    pub async fn list(
        pool: &PgPool,
        scope: TenantScope,
        state: Option<EmailState>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let emails = sqlx::query_as::<_, InboundEmail>(
            r#"
            SELECT id, tenant_id, from_address, subject, body, state, attempts,
                   last_error, claimed_at, load_id, created_at, updated_at
            FROM inbound_emails
            WHERE tenant_id = $1 AND ($2::email_state IS NULL OR state = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(scope.tenant_id())
        .bind(state)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(emails)
    }

    /// Manually resets a failed row back to pending
    ///
    /// Dashboard affordance for stuck emails: zeroes the attempt counter and
    /// clears the recorded error. Only `failed` rows can be reset.
    pub async fn reset(
        pool: &PgPool,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let email = sqlx::query_as::<_, InboundEmail>(
            r#"
            UPDATE inbound_emails
            SET state = 'pending', attempts = 0, last_error = NULL,
                claimed_at = NULL, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND state = 'failed'
            RETURNING id, tenant_id, from_address, subject, body, state, attempts,
                      last_error, claimed_at, load_id, created_at, updated_at
            "#,
        )
        .bind(scope.tenant_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_as_str() {
        assert_eq!(EmailState::Pending.as_str(), "pending");
        assert_eq!(EmailState::Parsing.as_str(), "parsing");
        assert_eq!(EmailState::Failed.as_str(), "failed");
    }

    #[test]
    fn test_terminal_states() {
        assert!(EmailState::Parsed.is_terminal());
        assert!(EmailState::Matched.is_terminal());
        assert!(EmailState::Failed.is_terminal());
        assert!(!EmailState::Pending.is_terminal());
        assert!(!EmailState::Parsing.is_terminal());
    }
}
