/// Driver endpoints

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
    models::driver::{CreateDriver, Driver, DriverStatus, UpdateDriver},
    models::membership::MembershipRole,
};
use serde::Deserialize;
use uuid::Uuid;

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by status (`active`, `on_leave`, `inactive`)
    pub status: Option<String>,
}

/// Lists drivers in the effective tenant
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Driver>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            DriverStatus::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };

    let drivers = Driver::list(&state.db, scope, status).await?;

    Ok(Json(drivers))
}

/// Creates a driver
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateDriver>,
) -> ApiResult<Json<Driver>> {
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
        return Err(ApiError::BadRequest("Driver name is required".to_string()));
    }

    let driver = Driver::create(&state.db, scope, req).await?;

    Ok(Json(driver))
}

/// Fetches one driver
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Driver>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let driver = Driver::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Driver not found".to_string()))?;

    Ok(Json(driver))
}

/// Updates a driver (including their pay formula)
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDriver>,
) -> ApiResult<Json<Driver>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let driver = Driver::update(&state.db, scope, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Driver not found".to_string()))?;

    Ok(Json(driver))
}

/// Deletes a driver
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

    let deleted = Driver::delete(&state.db, scope, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Driver not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
