/// Membership model and database operations
///
/// Many-to-many relationship between users and tenants with role-based
/// access control. Dispatchers are memberships with the `dispatcher` role;
/// there is no separate dispatcher table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('owner', 'admin', 'dispatcher', 'viewer');
///
/// CREATE TABLE memberships (
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'dispatcher',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (tenant_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: full control, billing settings, delete tenant
/// - **admin**: manage members, fleet, flags overrides within the tenant
/// - **dispatcher**: create and manage loads, fleet rows, hunt plans
/// - **viewer**: read-only access

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// RBAC roles for tenant memberships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Full control: billing settings, delete tenant, manage all members
    Owner,

    /// Can manage members, fleet, and tenant flag overrides
    Admin,

    /// Can create and manage loads, fleet rows, and hunt plans
    Dispatcher,

    /// Read-only access
    Viewer,
}

impl MembershipRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Dispatcher => "dispatcher",
            MembershipRole::Viewer => "viewer",
        }
    }

    /// Can manage members and role assignments
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MembershipRole::Owner | MembershipRole::Admin)
    }

    /// Can create and mutate loads, fleet rows, and hunt plans
    pub fn can_dispatch(&self) -> bool {
        !matches!(self, MembershipRole::Viewer)
    }

    /// Can view billing reports
    pub fn can_view_reports(&self) -> bool {
        matches!(
            self,
            MembershipRole::Owner | MembershipRole::Admin | MembershipRole::Dispatcher
        )
    }

    /// Can delete the tenant
    pub fn can_delete_tenant(&self) -> bool {
        matches!(self, MembershipRole::Owner)
    }

    /// Checks whether this role meets or exceeds a required role
    ///
    /// Hierarchy: Owner > Admin > Dispatcher > Viewer
    pub fn has_permission(&self, required: &MembershipRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            MembershipRole::Owner => 4,
            MembershipRole::Admin => 3,
            MembershipRole::Dispatcher => 2,
            MembershipRole::Viewer => 1,
        }
    }
}

/// Membership model representing a user-tenant relationship with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Tenant ID
    pub tenant_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the tenant
    pub role: MembershipRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// A membership joined with its tenant row
///
/// Tenant selection needs the tenant's slug alongside the membership, so the
/// listing query joins the two.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MembershipWithTenant {
    /// Tenant ID
    pub tenant_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the tenant
    pub role: MembershipRole,

    /// Tenant display name
    pub tenant_name: String,

    /// Tenant slug
    pub tenant_slug: String,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Tenant ID
    pub tenant_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Dispatcher)
    #[serde(default = "default_role")]
    pub role: MembershipRole,
}

fn default_role() -> MembershipRole {
    MembershipRole::Dispatcher
}

impl Membership {
    /// Creates a new membership (adds user to tenant)
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate membership, missing tenant/user, or
    /// connection failure.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING tenant_id, user_id, role, created_at
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by tenant and user
    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT tenant_id, user_id, role, created_at
            FROM memberships
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in a tenant
    pub async fn get_role(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRole>, sqlx::Error> {
        let role: Option<MembershipRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Updates a user's role in a tenant
    pub async fn update_role(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE tenant_id = $1 AND user_id = $2
            RETURNING tenant_id, user_id, role, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Deletes a membership (removes user from tenant)
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memberships WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a tenant, oldest first
    pub async fn list_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT tenant_id, user_id, role, created_at
            FROM memberships
            WHERE tenant_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists a user's memberships joined with tenant name and slug
    ///
    /// Returned in membership creation order; tenant selection depends on
    /// this ordering for its "first membership" fallback.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<MembershipWithTenant>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, MembershipWithTenant>(
            r#"
            SELECT m.tenant_id, m.user_id, m.role, t.name AS tenant_name,
                   t.slug AS tenant_slug, m.created_at
            FROM memberships m
            JOIN tenants t ON t.id = m.tenant_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Counts members in a tenant
    pub async fn count_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(MembershipRole::Owner.as_str(), "owner");
        assert_eq!(MembershipRole::Admin.as_str(), "admin");
        assert_eq!(MembershipRole::Dispatcher.as_str(), "dispatcher");
        assert_eq!(MembershipRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_role_permissions() {
        assert!(MembershipRole::Owner.can_manage_members());
        assert!(MembershipRole::Owner.can_delete_tenant());

        assert!(MembershipRole::Admin.can_manage_members());
        assert!(!MembershipRole::Admin.can_delete_tenant());

        assert!(MembershipRole::Dispatcher.can_dispatch());
        assert!(!MembershipRole::Dispatcher.can_manage_members());
        assert!(MembershipRole::Dispatcher.can_view_reports());

        assert!(!MembershipRole::Viewer.can_dispatch());
        assert!(!MembershipRole::Viewer.can_view_reports());
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(MembershipRole::Owner.has_permission(&MembershipRole::Admin));
        assert!(MembershipRole::Admin.has_permission(&MembershipRole::Dispatcher));
        assert!(!MembershipRole::Dispatcher.has_permission(&MembershipRole::Admin));
        assert!(MembershipRole::Viewer.has_permission(&MembershipRole::Viewer));
    }

    #[test]
    fn test_default_role_is_dispatcher() {
        assert_eq!(default_role(), MembershipRole::Dispatcher);
    }
}
