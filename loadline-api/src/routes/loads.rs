/// Load board endpoints
///
/// # Endpoints
///
/// - `GET    /v1/loads` - List loads, filterable by status
/// - `POST   /v1/loads` - Create a draft load
/// - `GET    /v1/loads/:id` - Fetch a load
/// - `PUT    /v1/loads/:id` - Update editable fields
/// - `DELETE /v1/loads/:id` - Delete a load
/// - `POST   /v1/loads/:id/assign` - Assign driver and vehicle
/// - `POST   /v1/loads/:id/status` - Move the load along its lifecycle

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
    models::driver::Driver,
    models::load::{CreateLoad, Equipment, Load, LoadSource, LoadStatus, Stop, UpdateLoad},
    models::membership::MembershipRole,
    models::vehicle::Vehicle,
};
use serde::Deserialize;
use uuid::Uuid;

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by lifecycle status
    pub status: Option<LoadStatus>,

    /// Page size (default 50, max 200)
    pub limit: Option<i64>,

    /// Page offset
    pub offset: Option<i64>,
}

/// Lists loads in the effective tenant, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Load>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let loads = Load::list(&state.db, scope, query.status, limit, offset).await?;

    Ok(Json(loads))
}

/// Create request
#[derive(Debug, Deserialize)]
pub struct CreateLoadRequest {
    pub reference: String,
    pub origin: Stop,
    pub destination: Stop,
    pub equipment: Equipment,
    #[serde(default)]
    pub rate_cents: i64,
    pub distance_miles: Option<f64>,
    pub broker_name: Option<String>,
    pub broker_mc: Option<String>,
}

/// Creates a draft load
///
/// # Errors
///
/// - `409 Conflict`: reference already used in the tenant
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateLoadRequest>,
) -> ApiResult<Json<Load>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    if req.reference.trim().is_empty() {
        return Err(ApiError::BadRequest("Reference is required".to_string()));
    }
    if req.rate_cents < 0 {
        return Err(ApiError::BadRequest("Rate cannot be negative".to_string()));
    }

    let load = Load::create(
        &state.db,
        scope,
        CreateLoad {
            reference: req.reference,
            origin: req.origin,
            destination: req.destination,
            equipment: req.equipment,
            rate_cents: req.rate_cents,
            distance_miles: req.distance_miles,
            broker_name: req.broker_name,
            broker_mc: req.broker_mc,
            broker_credit: None,
            source: LoadSource::Manual,
            created_by: Some(auth.user_id),
        },
    )
    .await?;

    Ok(Json(load))
}

/// Fetches one load
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Load>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let load = Load::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Load not found".to_string()))?;

    Ok(Json(load))
}

/// Updates a load's editable fields
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLoad>,
) -> ApiResult<Json<Load>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let load = Load::update(&state.db, scope, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Load not found".to_string()))?;

    Ok(Json(load))
}

/// Deletes a load
///
/// Only drafts and cancelled loads can be deleted; anything else is history.
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

    let load = Load::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Load not found".to_string()))?;

    if !matches!(load.status, LoadStatus::Draft | LoadStatus::Cancelled) {
        return Err(ApiError::Conflict(
            "Only draft or cancelled loads can be deleted".to_string(),
        ));
    }

    Load::delete(&state.db, scope, id).await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Assigns a driver and vehicle to an available load
///
/// # Errors
///
/// - `404 Not Found`: load, driver, or vehicle missing from the tenant
/// - `409 Conflict`: load is not on the board (`available`)
pub async fn assign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Load>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    Driver::find_by_id(&state.db, scope, req.driver_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Driver not found".to_string()))?;
    Vehicle::find_by_id(&state.db, scope, req.vehicle_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    let current = Load::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Load not found".to_string()))?;

    let load = Load::assign(&state.db, scope, id, req.driver_id, req.vehicle_id)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!(
                "Load is {}, not available",
                current.status.as_str()
            ))
        })?;

    Ok(Json(load))
}

/// Status transition request
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Target status
    pub status: LoadStatus,
}

/// Moves a load along its lifecycle
///
/// # Errors
///
/// - `409 Conflict`: the edge is not legal from the load's current status
pub async fn transition_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<Load>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let current = Load::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Load not found".to_string()))?;

    if !current.status.can_transition_to(req.status) {
        return Err(ApiError::Conflict(format!(
            "Cannot move load from {} to {}",
            current.status.as_str(),
            req.status.as_str()
        )));
    }

    let load = Load::transition(&state.db, scope, id, current.status, req.status)
        .await?
        .ok_or_else(|| {
            // The status changed between our read and the guarded update.
            ApiError::Conflict("Load status changed concurrently".to_string())
        })?;

    Ok(Json(load))
}
