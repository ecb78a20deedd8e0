/// Route handlers
///
/// One module per concern, nested by `app::build_router`.

pub mod admin;
pub mod auth;
pub mod flags;
pub mod fleet;
pub mod health;
pub mod hunter;
pub mod loads;
pub mod reports;
pub mod tenants;

use crate::{app::AppState, error::ApiResult};
use loadline_shared::auth::middleware::AuthContext;
use loadline_shared::tenancy::{Impersonation, TenantScope};

/// Resolves the tenant scope a request effectively operates in
///
/// The token carries the tenant resolved at login. For platform admins an
/// active impersonation overrides it, checked per request so expiry and
/// explicit stops take effect immediately, without reissuing tokens.
pub(crate) async fn effective_scope(
    state: &AppState,
    auth: &AuthContext,
) -> ApiResult<TenantScope> {
    if auth.platform_admin {
        if let Some(imp) = Impersonation::find_active_for_admin(&state.db, auth.user_id).await? {
            return Ok(TenantScope::new(imp.tenant_id));
        }
    }

    Ok(auth.scope())
}
