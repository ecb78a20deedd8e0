/// Tenant selection priority and persisted selection
///
/// On session start the effective tenant is chosen from the user's
/// memberships and their previously persisted selection:
///
/// 1. The stored tenant id, when it still matches a membership.
/// 2. The sole membership, when there is exactly one.
/// 3. The membership whose tenant slug is `"default"`.
/// 4. The first membership in returned order.
///
/// The result is persisted back; a user with no memberships has their
/// persisted row deleted.

use crate::models::membership::{Membership, MembershipWithTenant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Slug that rule 3 special-cases
const DEFAULT_SLUG: &str = "default";

/// Picks the tenant a session should start in
///
/// Pure selection over an in-order membership list; see the module docs for
/// the priority rules.
pub fn select_tenant<'a>(
    memberships: &'a [MembershipWithTenant],
    stored: Option<Uuid>,
) -> Option<&'a MembershipWithTenant> {
    if memberships.is_empty() {
        return None;
    }

    if let Some(stored_id) = stored {
        if let Some(m) = memberships.iter().find(|m| m.tenant_id == stored_id) {
            return Some(m);
        }
    }

    if memberships.len() == 1 {
        return memberships.first();
    }

    if let Some(m) = memberships.iter().find(|m| m.tenant_slug == DEFAULT_SLUG) {
        return Some(m);
    }

    memberships.first()
}

/// Persisted tenant selection, one row per user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TenantSelection {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl TenantSelection {
    /// Reads the stored selection for a user
    pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let tenant_id: Option<Uuid> =
            sqlx::query_scalar("SELECT tenant_id FROM tenant_selections WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(tenant_id)
    }

    /// Stores a selection, replacing any previous one
    pub async fn store(pool: &PgPool, user_id: Uuid, tenant_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tenant_selections (user_id, tenant_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                tenant_id = EXCLUDED.tenant_id,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Clears the stored selection for a user
    pub async fn clear(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tenant_selections WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

/// Resolves and persists the session tenant for a user
///
/// Loads memberships and the stored selection, applies the priority rules,
/// and writes the outcome back: the chosen tenant is stored, or the stored
/// row is cleared when no membership remains.
pub async fn resolve_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<MembershipWithTenant>, sqlx::Error> {
    let memberships = Membership::list_for_user(pool, user_id).await?;
    let stored = TenantSelection::find(pool, user_id).await?;

    match select_tenant(&memberships, stored).cloned() {
        Some(selected) => {
            if stored != Some(selected.tenant_id) {
                TenantSelection::store(pool, user_id, selected.tenant_id).await?;
            }
            Ok(Some(selected))
        }
        None => {
            if stored.is_some() {
                TenantSelection::clear(pool, user_id).await?;
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::membership::MembershipRole;

    fn membership(tenant_id: Uuid, slug: &str) -> MembershipWithTenant {
        MembershipWithTenant {
            tenant_id,
            user_id: Uuid::new_v4(),
            role: MembershipRole::Dispatcher,
            tenant_name: slug.to_string(),
            tenant_slug: slug.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_id_wins() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let memberships = vec![membership(a, "alpha"), membership(b, "beta")];

        let selected = select_tenant(&memberships, Some(b)).unwrap();
        assert_eq!(selected.tenant_id, b);
    }

    #[test]
    fn test_sole_membership_wins_over_stale_stored_id() {
        let a = Uuid::new_v4();
        let revoked = Uuid::new_v4();
        let memberships = vec![membership(a, "alpha")];

        let selected = select_tenant(&memberships, Some(revoked)).unwrap();
        assert_eq!(selected.tenant_id, a);
    }

    #[test]
    fn test_default_slug_wins_among_many() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let memberships = vec![
            membership(a, "alpha"),
            membership(b, "default"),
            membership(c, "gamma"),
        ];

        let selected = select_tenant(&memberships, None).unwrap();
        assert_eq!(selected.tenant_id, b);
    }

    #[test]
    fn test_first_membership_is_final_fallback() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let memberships = vec![membership(a, "alpha"), membership(b, "beta")];

        let selected = select_tenant(&memberships, None).unwrap();
        assert_eq!(selected.tenant_id, a);
    }

    #[test]
    fn test_no_memberships_selects_nothing() {
        assert!(select_tenant(&[], Some(Uuid::new_v4())).is_none());
        assert!(select_tenant(&[], None).is_none());
    }
}
