/// Feature gate check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /v1/flags/:key
/// ```
///
/// Returns the effective value of a flag for the caller in their effective
/// tenant (impersonation honored). Tenant-level values are served from the
/// process cache; user gating is applied per request on top.

use crate::{app::AppState, error::ApiResult, routes::effective_scope};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use loadline_shared::{
    auth::middleware::AuthContext,
    flags::resolution::resolve_tenant_value,
    models::{
        flag::{FeatureFlag, FlagOverride, UserFlagGrant},
        tenant::Tenant,
    },
};
use serde::Serialize;

/// Gate check response
#[derive(Debug, Serialize)]
pub struct FlagCheckResponse {
    /// Flag key
    pub key: String,

    /// Effective value for this user in this tenant
    pub enabled: bool,
}

/// Checks a feature gate for the current user
///
/// Unknown keys resolve to disabled.
pub async fn check_flag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
) -> ApiResult<Json<FlagCheckResponse>> {
    let scope = effective_scope(&state, &auth).await?;

    let Some(flag) = FeatureFlag::find_by_key(&state.db, &key).await? else {
        return Ok(Json(FlagCheckResponse {
            key,
            enabled: false,
        }));
    };

    let cached = state
        .flags
        .read()
        .expect("flag cache lock poisoned")
        .get(scope.tenant_id(), &key);

    let tenant_value = match cached {
        Some(value) => value,
        None => {
            let Some(tenant) = Tenant::find_by_id(&state.db, scope.tenant_id()).await? else {
                return Ok(Json(FlagCheckResponse {
                    key,
                    enabled: false,
                }));
            };

            let override_row = FlagOverride::find(&state.db, &key, scope.tenant_id()).await?;
            let value =
                resolve_tenant_value(&flag, override_row.map(|o| o.enabled), tenant.release_channel);

            state
                .flags
                .write()
                .expect("flag cache lock poisoned")
                .insert(scope.tenant_id(), key.clone(), value);

            value
        }
    };

    let user_allowed = if !flag.user_gated || auth.platform_admin {
        true
    } else {
        UserFlagGrant::exists(&state.db, &key, auth.user_id).await?
    };

    Ok(Json(FlagCheckResponse {
        key,
        enabled: tenant_value && user_allowed,
    }))
}
