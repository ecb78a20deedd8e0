/// Authorization checks
///
/// Three layers, checked in this order by handlers:
///
/// 1. **Tenant membership**: the user belongs to the effective tenant
/// 2. **Role**: the membership's role meets the required role
/// 3. **Platform admin**: for cross-tenant tooling (flags, impersonation)
///
/// Platform admins pass membership and role checks for any tenant; that is
/// what makes impersonation usable.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{Membership, MembershipRole};
use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the tenant
    #[error("Not a member of tenant {0}")]
    NotMember(Uuid),

    /// User doesn't have the required role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: MembershipRole,
        actual: MembershipRole,
    },

    /// Operation requires platform-admin status
    #[error("Platform admin required")]
    NotPlatformAdmin,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Requires that a user is a member of a tenant
///
/// Platform admins pass for any tenant.
pub async fn require_membership(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
    platform_admin: bool,
) -> Result<(), AuthzError> {
    if platform_admin {
        return Ok(());
    }

    match Membership::find(pool, tenant_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(AuthzError::NotMember(tenant_id)),
    }
}

/// Requires that a user holds at least `required` in a tenant
///
/// Platform admins pass for any tenant and role.
pub async fn require_role(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
    platform_admin: bool,
    required: MembershipRole,
) -> Result<(), AuthzError> {
    if platform_admin {
        return Ok(());
    }

    let actual = Membership::get_role(pool, tenant_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(tenant_id))?;

    if actual.has_permission(&required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole { required, actual })
    }
}

/// Requires platform-admin status, re-checked against the database
///
/// Token claims say what the user was at issue time; admin-only surfaces
/// re-read the row so a revoked admin bit takes effect immediately.
pub async fn require_platform_admin(pool: &PgPool, user_id: Uuid) -> Result<User, AuthzError> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .filter(|u| u.platform_admin)
        .ok_or(AuthzError::NotPlatformAdmin)?;

    Ok(user)
}
