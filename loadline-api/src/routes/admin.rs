/// Administrative tooling: flags and impersonation
///
/// Everything here requires platform-admin status, re-checked against the
/// database rather than trusted from token claims.
///
/// # Endpoints
///
/// - `GET    /v1/admin/flags` - List flag definitions
/// - `POST   /v1/admin/flags` - Create or replace a definition
/// - `DELETE /v1/admin/flags/:key` - Delete a definition
/// - `POST   /v1/admin/flags/:key/overrides` - Set a tenant override
/// - `DELETE /v1/admin/flags/:key/overrides/:tenant_id` - Clear an override
/// - `POST   /v1/admin/flags/:key/grants` - Grant a user-gated flag
/// - `DELETE /v1/admin/flags/:key/grants/:user_id` - Revoke a grant
/// - `POST   /v1/admin/impersonations` - Start impersonating a tenant
/// - `POST   /v1/admin/impersonations/:id/stop` - Stop an impersonation

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use loadline_shared::{
    auth::{authorization, middleware::AuthContext},
    flags::resolution::resolve_tenant_value,
    models::{
        flag::{FeatureFlag, FlagOverride, UpsertFeatureFlag, UserFlagGrant},
        tenant::Tenant,
    },
    tenancy::{Impersonation, SessionContext},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lists every flag definition
pub async fn list_flags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<FeatureFlag>>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let flags = FeatureFlag::list(&state.db).await?;

    Ok(Json(flags))
}

/// Creates or replaces a flag definition
///
/// Definition changes affect every tenant, so the whole flag cache is
/// dropped.
pub async fn upsert_flag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpsertFeatureFlag>,
) -> ApiResult<Json<FeatureFlag>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    if req.key.is_empty() || req.key.len() > 100 {
        return Err(ApiError::BadRequest(
            "Flag key must be 1-100 characters".to_string(),
        ));
    }

    let flag = FeatureFlag::upsert(&state.db, req).await?;

    state
        .flags
        .write()
        .expect("flag cache lock poisoned")
        .invalidate_all();

    Ok(Json(flag))
}

/// Deletes a flag definition, cascading to overrides and grants
pub async fn delete_flag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let deleted = FeatureFlag::delete(&state.db, &key).await?;
    if !deleted {
        return Err(ApiError::NotFound("Flag not found".to_string()));
    }

    state
        .flags
        .write()
        .expect("flag cache lock poisoned")
        .invalidate_all();

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Override request
#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    /// Tenant receiving the override
    pub tenant_id: Uuid,

    /// Override value
    pub enabled: bool,
}

/// Sets a tenant override for a flag
///
/// The cached tenant-level value updates optimistically; a failed database
/// write reverts the cache to its prior snapshot, so readers never see a
/// toggle that didn't stick.
pub async fn set_override(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<SetOverrideRequest>,
) -> ApiResult<Json<FlagOverride>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let flag = FeatureFlag::find_by_key(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flag not found".to_string()))?;

    let tenant = Tenant::find_by_id(&state.db, req.tenant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".to_string()))?;

    // The cache holds resolved tenant-level values, not raw override bits;
    // a killswitch stays off no matter what the override says.
    let resolved = resolve_tenant_value(&flag, Some(req.enabled), tenant.release_channel);

    let snapshot = state
        .flags
        .write()
        .expect("flag cache lock poisoned")
        .set_optimistic(req.tenant_id, key.clone(), resolved);

    match FlagOverride::set(&state.db, &key, req.tenant_id, req.enabled).await {
        Ok(row) => Ok(Json(row)),
        Err(e) => {
            state
                .flags
                .write()
                .expect("flag cache lock poisoned")
                .revert(snapshot);
            Err(e.into())
        }
    }
}

/// Clears a tenant override
pub async fn clear_override(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((key, tenant_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let cleared = FlagOverride::clear(&state.db, &key, tenant_id).await?;
    if !cleared {
        return Err(ApiError::NotFound("Override not found".to_string()));
    }

    state
        .flags
        .write()
        .expect("flag cache lock poisoned")
        .invalidate_tenant(tenant_id);

    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// Grant request
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// User receiving the grant
    pub user_id: Uuid,
}

/// Grants a user-gated flag to a user
pub async fn grant_flag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<GrantRequest>,
) -> ApiResult<Json<UserFlagGrant>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    FeatureFlag::find_by_key(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flag not found".to_string()))?;

    let grant = UserFlagGrant::grant(&state.db, &key, req.user_id).await?;

    Ok(Json(grant))
}

/// Revokes a user grant
pub async fn revoke_grant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((key, user_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let revoked = UserFlagGrant::revoke(&state.db, &key, user_id).await?;
    if !revoked {
        return Err(ApiError::NotFound("Grant not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "revoked": true })))
}

/// Impersonation request
#[derive(Debug, Deserialize)]
pub struct StartImpersonationRequest {
    /// Tenant to impersonate
    pub tenant_id: Uuid,

    /// Window length in minutes (default 60, capped at 8 hours)
    pub minutes: Option<i64>,
}

/// Impersonation response
#[derive(Debug, Serialize)]
pub struct ImpersonationResponse {
    /// Impersonation ID, used to stop it
    pub id: String,

    /// Tenant being viewed
    pub tenant_id: String,

    /// When the override expires on its own
    pub expires_at: String,
}

/// Starts impersonating a tenant
///
/// The override replaces the effective tenant on every subsequent request
/// until stopped or expired; the admin's persisted selection is untouched.
pub async fn start_impersonation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<StartImpersonationRequest>,
) -> ApiResult<Json<ImpersonationResponse>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    Tenant::find_by_id(&state.db, req.tenant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".to_string()))?;

    let mut session = SessionContext::start(&state.db, auth.user_id).await?;
    let imp = session
        .begin_impersonation(&state.db, req.tenant_id, req.minutes)
        .await?;

    Ok(Json(ImpersonationResponse {
        id: imp.id.to_string(),
        tenant_id: imp.tenant_id.to_string(),
        expires_at: imp.expires_at.to_rfc3339(),
    }))
}

/// Stops an impersonation; idempotent
pub async fn stop_impersonation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    authorization::require_platform_admin(&state.db, auth.user_id).await?;

    let row = Impersonation::stop(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Impersonation not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "stopped": true,
        "tenant_id": row.tenant_id,
    })))
}
