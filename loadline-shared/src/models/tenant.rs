/// Tenant model and database operations
///
/// Tenants are the top-level entity for multi-tenant isolation. Every user
/// belongs to one or more tenants via the Membership model, and every
/// domain row (loads, drivers, vehicles, hunt plans) carries a tenant id.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE release_channel AS ENUM ('internal', 'pilot', 'general');
///
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     release_channel release_channel NOT NULL DEFAULT 'general',
///     settings JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use loadline_shared::models::tenant::{CreateTenant, ReleaseChannel, Tenant};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let tenant = Tenant::create(&pool, CreateTenant {
///     name: "Acme Logistics".to_string(),
///     slug: "acme-logistics".to_string(),
///     release_channel: ReleaseChannel::General,
/// }).await?;
/// println!("created tenant {}", tenant.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Rollout stage used to stage feature availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "release_channel", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    /// Dogfooding tenants (Loadline staff)
    Internal,

    /// Early-access customers
    Pilot,

    /// Everyone else
    General,
}

impl ReleaseChannel {
    /// Converts channel to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseChannel::Internal => "internal",
            ReleaseChannel::Pilot => "pilot",
            ReleaseChannel::General => "general",
        }
    }

    /// Parses channel from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(ReleaseChannel::Internal),
            "pilot" => Some(ReleaseChannel::Pilot),
            "general" => Some(ReleaseChannel::General),
            _ => None,
        }
    }
}

/// Tenant model representing an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// URL-safe unique identifier; the slug `"default"` is special-cased by
    /// tenant selection
    pub slug: String,

    /// Rollout stage for feature-flag channel defaults
    pub release_channel: ReleaseChannel,

    /// Tenant-specific configuration (JSONB)
    pub settings: JsonValue,

    /// When the tenant was created
    pub created_at: DateTime<Utc>,

    /// When the tenant was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Organization name
    pub name: String,

    /// URL-safe unique identifier
    pub slug: String,

    /// Initial rollout stage (defaults to General)
    #[serde(default = "default_channel")]
    pub release_channel: ReleaseChannel,
}

fn default_channel() -> ReleaseChannel {
    ReleaseChannel::General
}

/// Input for updating an existing tenant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenant {
    /// New name
    pub name: Option<String>,

    /// New release channel
    pub release_channel: Option<ReleaseChannel>,

    /// Settings to merge into existing settings
    pub settings: Option<JsonValue>,
}

/// Derives a URL-safe slug from an organization name
///
/// Lowercases, maps runs of non-alphanumeric characters to single hyphens,
/// and trims. Collisions are the caller's problem; [`Tenant::create_with_unique_slug`]
/// retries with a random suffix.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("tenant");
    }

    slug.truncate(90);
    slug
}

impl Tenant {
    /// Creates a new tenant in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is already taken or the connection fails.
    pub async fn create(pool: &PgPool, data: CreateTenant) -> Result<Self, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug, release_channel)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, release_channel, settings, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.slug)
        .bind(data.release_channel)
        .fetch_one(pool)
        .await?;

        Ok(tenant)
    }

    /// Creates a tenant, retrying with a random slug suffix on collision
    ///
    /// Used at registration, where the slug is derived from the organization
    /// name and the caller cannot pick a different one.
    pub async fn create_with_unique_slug(
        pool: &PgPool,
        name: String,
        channel: ReleaseChannel,
    ) -> Result<Self, sqlx::Error> {
        let base = slugify(&name);

        let mut slug = base.clone();
        for _ in 0..4 {
            let result = Tenant::create(
                pool,
                CreateTenant {
                    name: name.clone(),
                    slug: slug.clone(),
                    release_channel: channel,
                },
            )
            .await;

            match result {
                Err(sqlx::Error::Database(ref db_err))
                    if db_err.constraint() == Some("tenants_slug_key") =>
                {
                    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
                    slug = format!("{}-{}", base, suffix);
                }
                other => return other,
            }
        }

        // Four random collisions in a row means something else is wrong.
        Err(sqlx::Error::Protocol("could not allocate a unique tenant slug".into()))
    }

    /// Finds a tenant by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, release_channel, settings, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, release_channel, settings, created_at, updated_at
            FROM tenants
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Updates an existing tenant
    ///
    /// Only non-None fields are written; settings are merged into the
    /// existing JSONB rather than replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTenant,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tenants SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.release_channel.is_some() {
            bind_count += 1;
            query.push_str(&format!(", release_channel = ${}", bind_count));
        }
        if data.settings.is_some() {
            bind_count += 1;
            query.push_str(&format!(", settings = settings || ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, slug, release_channel, settings, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Tenant>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(channel) = data.release_channel {
            q = q.bind(channel);
        }
        if let Some(settings) = data.settings {
            q = q.bind(settings);
        }

        let tenant = q.fetch_optional(pool).await?;

        Ok(tenant)
    }

    /// Deletes a tenant by ID
    ///
    /// Cascades to all tenant-scoped data.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all tenants with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, release_channel, settings, created_at, updated_at
            FROM tenants
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_channel_round_trip() {
        for channel in [
            ReleaseChannel::Internal,
            ReleaseChannel::Pilot,
            ReleaseChannel::General,
        ] {
            assert_eq!(ReleaseChannel::from_str(channel.as_str()), Some(channel));
        }
        assert_eq!(ReleaseChannel::from_str("beta"), None);
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Logistics"), "acme-logistics");
        assert_eq!(slugify("  J&B  Trucking, LLC "), "j-b-trucking-llc");
    }

    #[test]
    fn test_slugify_degenerate_input() {
        assert_eq!(slugify("!!!"), "tenant");
        assert_eq!(slugify(""), "tenant");
    }

    #[test]
    fn test_slugify_is_bounded() {
        let long = "x".repeat(500);
        assert!(slugify(&long).len() <= 90);
    }

    // Integration tests for database operations live with the API tests.
}
