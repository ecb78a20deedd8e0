/// Impersonation model and database operations
///
/// A platform admin can view the product as a tenant for a bounded window.
/// The override lives in its own table and never touches the admin's
/// persisted tenant selection: stopping it (or letting it expire) restores
/// the underlying selection untouched.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE impersonations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     admin_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     stopped_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default impersonation window
const DEFAULT_MINUTES: i64 = 60;

/// Hard cap on a single impersonation window
const MAX_MINUTES: i64 = 8 * 60;

/// Impersonation row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Impersonation {
    pub id: Uuid,

    /// Platform admin doing the impersonating
    pub admin_user_id: Uuid,

    /// Tenant being viewed
    pub tenant_id: Uuid,

    /// When the window closes regardless of activity
    pub expires_at: DateTime<Utc>,

    /// When the admin explicitly stopped, if they did
    pub stopped_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Impersonation {
    /// Whether this impersonation currently overrides the session tenant
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.stopped_at.is_none() && self.expires_at > now
    }

    /// Whether this impersonation is active right now
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Starts an impersonation window
    ///
    /// `minutes` is clamped to the 8-hour cap; zero or negative requests get
    /// the 60-minute default. Caller is responsible for having verified
    /// platform-admin status.
    pub async fn start(
        pool: &PgPool,
        admin_user_id: Uuid,
        tenant_id: Uuid,
        minutes: Option<i64>,
    ) -> Result<Self, sqlx::Error> {
        let minutes = match minutes {
            Some(m) if m > 0 => m.min(MAX_MINUTES),
            _ => DEFAULT_MINUTES,
        };
        let expires_at = Utc::now() + Duration::minutes(minutes);

        let row = sqlx::query_as::<_, Impersonation>(
            r#"
            INSERT INTO impersonations (admin_user_id, tenant_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, admin_user_id, tenant_id, expires_at, stopped_at, created_at
            "#,
        )
        .bind(admin_user_id)
        .bind(tenant_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Stops an impersonation; idempotent
    ///
    /// Returns the row whether or not this call was the one that stopped it.
    pub async fn stop(
        pool: &PgPool,
        admin_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE impersonations
            SET stopped_at = NOW()
            WHERE id = $1 AND admin_user_id = $2 AND stopped_at IS NULL
            "#,
        )
        .bind(id)
        .bind(admin_user_id)
        .execute(pool)
        .await?;

        let row = sqlx::query_as::<_, Impersonation>(
            r#"
            SELECT id, admin_user_id, tenant_id, expires_at, stopped_at, created_at
            FROM impersonations
            WHERE id = $1 AND admin_user_id = $2
            "#,
        )
        .bind(id)
        .bind(admin_user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Finds the admin's currently active impersonation, if any
    ///
    /// Expired and stopped rows are filtered in SQL, so this never returns
    /// an inactive override.
    pub async fn find_active_for_admin(
        pool: &PgPool,
        admin_user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Impersonation>(
            r#"
            SELECT id, admin_user_id, tenant_id, expires_at, stopped_at, created_at
            FROM impersonations
            WHERE admin_user_id = $1 AND stopped_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(admin_user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(expires_in_minutes: i64, stopped: bool) -> Impersonation {
        let now = Utc::now();
        Impersonation {
            id: Uuid::new_v4(),
            admin_user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            expires_at: now + Duration::minutes(expires_in_minutes),
            stopped_at: stopped.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn test_unexpired_unstopped_is_active() {
        assert!(row(30, false).is_active());
    }

    #[test]
    fn test_expired_is_inactive() {
        assert!(!row(-1, false).is_active());
    }

    #[test]
    fn test_stopped_is_inactive_even_before_expiry() {
        assert!(!row(30, true).is_active());
    }
}
