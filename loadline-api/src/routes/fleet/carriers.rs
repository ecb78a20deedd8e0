/// Carrier endpoints

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::effective_scope,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use loadline_shared::{
    auth::{authorization, middleware::AuthContext},
    models::carrier::{Carrier, CarrierStatus, CreateCarrier, UpdateCarrier},
    models::membership::MembershipRole,
};
use serde::Deserialize;
use uuid::Uuid;

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by status (`active` or `inactive`)
    pub status: Option<String>,
}

/// Lists carriers in the effective tenant
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Carrier>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            CarrierStatus::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };

    let carriers = Carrier::list(&state.db, scope, status).await?;

    Ok(Json(carriers))
}

/// Creates a carrier
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCarrier>,
) -> ApiResult<Json<Carrier>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Carrier name is required".to_string()));
    }

    let carrier = Carrier::create(&state.db, scope, req).await?;

    Ok(Json(carrier))
}

/// Fetches one carrier
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Carrier>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let carrier = Carrier::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Carrier not found".to_string()))?;

    Ok(Json(carrier))
}

/// Updates a carrier
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCarrier>,
) -> ApiResult<Json<Carrier>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let carrier = Carrier::update(&state.db, scope, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Carrier not found".to_string()))?;

    Ok(Json(carrier))
}

/// Deletes a carrier; its drivers are left unattached
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Admin,
    )
    .await?;

    let deleted = Carrier::delete(&state.db, scope, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Carrier not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
