/// Feature flag models and database operations
///
/// Three tables drive the gate cascade resolved in [`crate::flags`]:
/// flag definitions (with global and per-channel defaults), tenant
/// overrides, and per-user grants for user-gated flags.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE flag_kind AS ENUM ('release', 'killswitch');
///
/// CREATE TABLE feature_flags (
///     key VARCHAR(100) PRIMARY KEY,
///     description TEXT NOT NULL DEFAULT '',
///     kind flag_kind NOT NULL DEFAULT 'release',
///     enabled_default BOOLEAN NOT NULL DEFAULT FALSE,
///     internal_default BOOLEAN,
///     pilot_default BOOLEAN,
///     general_default BOOLEAN,
///     user_gated BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE flag_overrides (
///     flag_key VARCHAR(100) REFERENCES feature_flags(key) ON DELETE CASCADE,
///     tenant_id UUID REFERENCES tenants(id) ON DELETE CASCADE,
///     enabled BOOLEAN NOT NULL,
///     PRIMARY KEY (flag_key, tenant_id)
/// );
///
/// CREATE TABLE flag_grants (
///     flag_key VARCHAR(100) REFERENCES feature_flags(key) ON DELETE CASCADE,
///     user_id UUID REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (flag_key, user_id)
/// );
/// ```

use crate::models::tenant::ReleaseChannel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Flag category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "flag_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Normal staged-rollout flag
    Release,

    /// Emergency-off flag: a false global default wins over everything
    Killswitch,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Release => "release",
            FlagKind::Killswitch => "killswitch",
        }
    }
}

/// Feature flag definition
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeatureFlag {
    /// Flag key, e.g. `"load_hunter"` or `"billing_v2"`
    pub key: String,

    pub description: String,
    pub kind: FlagKind,

    /// Global default, the last stop in the cascade
    pub enabled_default: bool,

    /// Per-channel defaults; None means the channel defers to the global
    /// default
    pub internal_default: Option<bool>,
    pub pilot_default: Option<bool>,
    pub general_default: Option<bool>,

    /// Whether individual users additionally need a grant (or platform-admin
    /// status)
    pub user_gated: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// Channel default for a release channel, when defined
    pub fn channel_default(&self, channel: ReleaseChannel) -> Option<bool> {
        match channel {
            ReleaseChannel::Internal => self.internal_default,
            ReleaseChannel::Pilot => self.pilot_default,
            ReleaseChannel::General => self.general_default,
        }
    }
}

/// Input for creating or replacing a flag definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertFeatureFlag {
    pub key: String,
    #[serde(default)]
    pub description: String,
    pub kind: FlagKind,
    pub enabled_default: bool,
    pub internal_default: Option<bool>,
    pub pilot_default: Option<bool>,
    pub general_default: Option<bool>,
    #[serde(default)]
    pub user_gated: bool,
}

/// Tenant-specific override row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FlagOverride {
    pub flag_key: String,
    pub tenant_id: Uuid,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user grant row for user-gated flags
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserFlagGrant {
    pub flag_key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// Creates or replaces a flag definition
    pub async fn upsert(pool: &PgPool, data: UpsertFeatureFlag) -> Result<Self, sqlx::Error> {
        let flag = sqlx::query_as::<_, FeatureFlag>(
            r#"
            INSERT INTO feature_flags (key, description, kind, enabled_default,
                                       internal_default, pilot_default, general_default, user_gated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (key) DO UPDATE SET
                description = EXCLUDED.description,
                kind = EXCLUDED.kind,
                enabled_default = EXCLUDED.enabled_default,
                internal_default = EXCLUDED.internal_default,
                pilot_default = EXCLUDED.pilot_default,
                general_default = EXCLUDED.general_default,
                user_gated = EXCLUDED.user_gated,
                updated_at = NOW()
            RETURNING key, description, kind, enabled_default, internal_default,
                      pilot_default, general_default, user_gated, created_at, updated_at
            "#,
        )
        .bind(data.key)
        .bind(data.description)
        .bind(data.kind)
        .bind(data.enabled_default)
        .bind(data.internal_default)
        .bind(data.pilot_default)
        .bind(data.general_default)
        .bind(data.user_gated)
        .fetch_one(pool)
        .await?;

        Ok(flag)
    }

    /// Finds a flag by key
    pub async fn find_by_key(pool: &PgPool, key: &str) -> Result<Option<Self>, sqlx::Error> {
        let flag = sqlx::query_as::<_, FeatureFlag>(
            r#"
            SELECT key, description, kind, enabled_default, internal_default,
                   pilot_default, general_default, user_gated, created_at, updated_at
            FROM feature_flags
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(flag)
    }

    /// Lists every flag definition, by key
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let flags = sqlx::query_as::<_, FeatureFlag>(
            r#"
            SELECT key, description, kind, enabled_default, internal_default,
                   pilot_default, general_default, user_gated, created_at, updated_at
            FROM feature_flags
            ORDER BY key ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(flags)
    }

    /// Deletes a flag definition, cascading to overrides and grants
    pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feature_flags WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl FlagOverride {
    /// Sets a tenant override, replacing any existing one
    pub async fn set(
        pool: &PgPool,
        flag_key: &str,
        tenant_id: Uuid,
        enabled: bool,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, FlagOverride>(
            r#"
            INSERT INTO flag_overrides (flag_key, tenant_id, enabled)
            VALUES ($1, $2, $3)
            ON CONFLICT (flag_key, tenant_id) DO UPDATE SET
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            RETURNING flag_key, tenant_id, enabled, created_at, updated_at
            "#,
        )
        .bind(flag_key)
        .bind(tenant_id)
        .bind(enabled)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Finds the override for a flag/tenant pair
    pub async fn find(
        pool: &PgPool,
        flag_key: &str,
        tenant_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, FlagOverride>(
            r#"
            SELECT flag_key, tenant_id, enabled, created_at, updated_at
            FROM flag_overrides
            WHERE flag_key = $1 AND tenant_id = $2
            "#,
        )
        .bind(flag_key)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Lists all overrides for a tenant
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FlagOverride>(
            r#"
            SELECT flag_key, tenant_id, enabled, created_at, updated_at
            FROM flag_overrides
            WHERE tenant_id = $1
            ORDER BY flag_key ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Removes a tenant override
    pub async fn clear(pool: &PgPool, flag_key: &str, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM flag_overrides WHERE flag_key = $1 AND tenant_id = $2")
                .bind(flag_key)
                .bind(tenant_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UserFlagGrant {
    /// Grants a user-gated flag to a user; idempotent
    pub async fn grant(pool: &PgPool, flag_key: &str, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, UserFlagGrant>(
            r#"
            INSERT INTO flag_grants (flag_key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (flag_key, user_id) DO UPDATE SET flag_key = EXCLUDED.flag_key
            RETURNING flag_key, user_id, created_at
            "#,
        )
        .bind(flag_key)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Checks whether a user holds a grant
    pub async fn exists(pool: &PgPool, flag_key: &str, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM flag_grants
                WHERE flag_key = $1 AND user_id = $2
            )
            "#,
        )
        .bind(flag_key)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Revokes a grant
    pub async fn revoke(pool: &PgPool, flag_key: &str, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM flag_grants WHERE flag_key = $1 AND user_id = $2")
            .bind(flag_key)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> FeatureFlag {
        FeatureFlag {
            key: "load_hunter".to_string(),
            description: String::new(),
            kind: FlagKind::Release,
            enabled_default: false,
            internal_default: Some(true),
            pilot_default: None,
            general_default: Some(false),
            user_gated: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_channel_default_lookup() {
        let f = flag();
        assert_eq!(f.channel_default(ReleaseChannel::Internal), Some(true));
        assert_eq!(f.channel_default(ReleaseChannel::Pilot), None);
        assert_eq!(f.channel_default(ReleaseChannel::General), Some(false));
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(FlagKind::Release.as_str(), "release");
        assert_eq!(FlagKind::Killswitch.as_str(), "killswitch");
    }
}
