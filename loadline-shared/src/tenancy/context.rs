/// Session context and tenant scope
///
/// [`SessionContext`] is the explicit form of "which tenant am I looking
/// at": built once after authentication, consulted for the effective tenant,
/// rebuilt on tenant switch, dropped at logout. An active impersonation
/// overrides the effective tenant without mutating the persisted selection
/// underneath it.
///
/// [`TenantScope`] is the portable product of that decision: a copyable
/// witness that some caller resolved a tenant. Model queries take it instead
/// of a raw `Uuid` so tenant isolation shows up in every signature.

use crate::models::membership::{Membership, MembershipWithTenant};
use crate::models::user::User;
use crate::tenancy::impersonation::Impersonation;
use crate::tenancy::selection;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Witness that a tenant has been resolved for the current operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope(Uuid);

impl TenantScope {
    /// Wraps a resolved tenant id
    pub fn new(tenant_id: Uuid) -> Self {
        Self(tenant_id)
    }

    /// The tenant all scoped queries filter on
    pub fn tenant_id(&self) -> Uuid {
        self.0
    }
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// User does not exist
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// User is not a member of the requested tenant
    #[error("Not a member of tenant {0}")]
    NotAMember(Uuid),

    /// Operation requires platform-admin status
    #[error("Platform admin required")]
    NotPlatformAdmin,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-session tenant context
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Authenticated user
    pub user: User,

    /// The user's memberships, in creation order
    pub memberships: Vec<MembershipWithTenant>,

    /// Resolved and persisted selection
    selected: Option<MembershipWithTenant>,

    /// Active impersonation override, platform admins only
    impersonation: Option<Impersonation>,
}

impl SessionContext {
    /// Builds the context at session start
    ///
    /// Resolves and persists the tenant selection, and picks up any active
    /// impersonation when the user is a platform admin.
    pub async fn start(pool: &PgPool, user_id: Uuid) -> Result<Self, SessionError> {
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(SessionError::UserNotFound(user_id))?;

        let memberships = Membership::list_for_user(pool, user_id).await?;
        let selected = selection::resolve_for_user(pool, user_id).await?;

        let impersonation = if user.platform_admin {
            Impersonation::find_active_for_admin(pool, user_id).await?
        } else {
            None
        };

        Ok(Self {
            user,
            memberships,
            selected,
            impersonation,
        })
    }

    /// The tenant this session effectively sees
    ///
    /// An active impersonation wins; otherwise the persisted selection.
    pub fn effective_tenant(&self) -> Option<Uuid> {
        if let Some(ref imp) = self.impersonation {
            if imp.is_active() {
                return Some(imp.tenant_id);
            }
        }
        self.selected.as_ref().map(|m| m.tenant_id)
    }

    /// The persisted selection, ignoring any impersonation
    pub fn selected_tenant(&self) -> Option<Uuid> {
        self.selected.as_ref().map(|m| m.tenant_id)
    }

    /// Scope for the effective tenant
    pub fn scope(&self) -> Option<TenantScope> {
        self.effective_tenant().map(TenantScope::new)
    }

    /// Whether an impersonation override is currently in force
    pub fn is_impersonating(&self) -> bool {
        self.impersonation
            .as_ref()
            .map(|i| i.is_active())
            .unwrap_or(false)
    }

    /// Switches the persisted selection to another tenant
    ///
    /// The user must hold a membership in the target tenant. Does not touch
    /// any impersonation override.
    pub async fn switch_tenant(
        &mut self,
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<(), SessionError> {
        let membership = self
            .memberships
            .iter()
            .find(|m| m.tenant_id == tenant_id)
            .cloned()
            .ok_or(SessionError::NotAMember(tenant_id))?;

        selection::TenantSelection::store(pool, self.user.id, tenant_id).await?;
        self.selected = Some(membership);

        Ok(())
    }

    /// Starts impersonating a tenant
    ///
    /// Platform admins only; the override is time-boxed and replaces the
    /// effective tenant until stopped or expired.
    pub async fn begin_impersonation(
        &mut self,
        pool: &PgPool,
        tenant_id: Uuid,
        minutes: Option<i64>,
    ) -> Result<Impersonation, SessionError> {
        if !self.user.platform_admin {
            return Err(SessionError::NotPlatformAdmin);
        }

        let imp = Impersonation::start(pool, self.user.id, tenant_id, minutes).await?;
        self.impersonation = Some(imp.clone());

        Ok(imp)
    }

    /// Stops the active impersonation, restoring the underlying selection
    pub async fn end_impersonation(&mut self, pool: &PgPool) -> Result<(), SessionError> {
        if let Some(imp) = self.impersonation.take() {
            Impersonation::stop(pool, self.user.id, imp.id).await?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        user: User,
        memberships: Vec<MembershipWithTenant>,
        selected: Option<MembershipWithTenant>,
        impersonation: Option<Impersonation>,
    ) -> Self {
        Self {
            user,
            memberships,
            selected,
            impersonation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::membership::MembershipRole;
    use chrono::{Duration, Utc};

    fn user(platform_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            platform_admin,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn membership(tenant_id: Uuid) -> MembershipWithTenant {
        MembershipWithTenant {
            tenant_id,
            user_id: Uuid::new_v4(),
            role: MembershipRole::Owner,
            tenant_name: "Acme".to_string(),
            tenant_slug: "acme".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_tenant_is_selection_without_impersonation() {
        let tenant = Uuid::new_v4();
        let m = membership(tenant);
        let ctx = SessionContext::for_tests(user(false), vec![m.clone()], Some(m), None);

        assert_eq!(ctx.effective_tenant(), Some(tenant));
        assert!(!ctx.is_impersonating());
    }

    #[test]
    fn test_active_impersonation_overrides_selection() {
        let selected = Uuid::new_v4();
        let impersonated = Uuid::new_v4();
        let m = membership(selected);
        let admin = user(true);

        let imp = Impersonation {
            id: Uuid::new_v4(),
            admin_user_id: admin.id,
            tenant_id: impersonated,
            expires_at: Utc::now() + Duration::minutes(30),
            stopped_at: None,
            created_at: Utc::now(),
        };

        let ctx = SessionContext::for_tests(admin, vec![m.clone()], Some(m), Some(imp));

        assert_eq!(ctx.effective_tenant(), Some(impersonated));
        // The underlying selection is untouched
        assert_eq!(ctx.selected_tenant(), Some(selected));
        assert!(ctx.is_impersonating());
    }

    #[test]
    fn test_expired_impersonation_falls_back_to_selection() {
        let selected = Uuid::new_v4();
        let m = membership(selected);
        let admin = user(true);

        let imp = Impersonation {
            id: Uuid::new_v4(),
            admin_user_id: admin.id,
            tenant_id: Uuid::new_v4(),
            expires_at: Utc::now() - Duration::minutes(1),
            stopped_at: None,
            created_at: Utc::now() - Duration::hours(2),
        };

        let ctx = SessionContext::for_tests(admin, vec![m.clone()], Some(m), Some(imp));

        assert_eq!(ctx.effective_tenant(), Some(selected));
        assert!(!ctx.is_impersonating());
    }
}
