/// Vehicle endpoints

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
    models::membership::MembershipRole,
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleStatus},
};
use serde::Deserialize;
use uuid::Uuid;

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by status (`active`, `maintenance`, `retired`)
    pub status: Option<String>,
}

/// Lists vehicles in the effective tenant
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Vehicle>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            VehicleStatus::from_str(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };

    let vehicles = Vehicle::list(&state.db, scope, status).await?;

    Ok(Json(vehicles))
}

/// Creates a vehicle
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateVehicle>,
) -> ApiResult<Json<Vehicle>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    if req.unit_number.trim().is_empty() {
        return Err(ApiError::BadRequest("Unit number is required".to_string()));
    }

    let vehicle = Vehicle::create(&state.db, scope, req).await?;

    Ok(Json(vehicle))
}

/// Fetches one vehicle
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vehicle>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let vehicle = Vehicle::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(vehicle))
}

/// Updates a vehicle
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVehicle>,
) -> ApiResult<Json<Vehicle>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let vehicle = Vehicle::update(&state.db, scope, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(vehicle))
}

/// Driver assignment request
#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    /// Driver to seat in the unit; null to clear
    pub driver_id: Option<Uuid>,
}

/// Assigns or clears the vehicle's driver
pub async fn assign_driver(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignDriverRequest>,
) -> ApiResult<Json<Vehicle>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let vehicle = Vehicle::assign_driver(&state.db, scope, id, req.driver_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json(vehicle))
}

/// Deletes a vehicle
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

    let deleted = Vehicle::delete(&state.db, scope, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Vehicle not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
