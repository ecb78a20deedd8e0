/// Load Hunter endpoints: plans, inbound queue, matches
///
/// # Endpoints
///
/// - `GET    /v1/hunter/plans` - List hunt plans
/// - `POST   /v1/hunter/plans` - Create a hunt plan
/// - `PUT    /v1/hunter/plans/:id` - Update a hunt plan
/// - `DELETE /v1/hunter/plans/:id` - Delete a hunt plan
/// - `POST   /v1/hunter/inbound` - Provider webhook: enqueue an email
/// - `GET    /v1/hunter/queue` - Queue dashboard, filterable by state
/// - `POST   /v1/hunter/queue/:id/reset` - Manually reset a failed email
/// - `GET    /v1/hunter/matches` - Recent hunt matches

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
    models::hunt_plan::{CreateHuntPlan, HuntMatch, HuntPlan, UpdateHuntPlan},
    models::inbound_email::{CreateInboundEmail, EmailState, InboundEmail},
    models::membership::MembershipRole,
};
use serde::Deserialize;
use uuid::Uuid;

/// Lists hunt plans in the effective tenant
pub async fn list_plans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<HuntPlan>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let plans = HuntPlan::list(&state.db, scope).await?;

    Ok(Json(plans))
}

/// Creates a hunt plan
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateHuntPlan>,
) -> ApiResult<Json<HuntPlan>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    if req.origin_radius_miles <= 0.0 {
        return Err(ApiError::BadRequest(
            "Origin radius must be positive".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&req.origin_lat) || !(-180.0..=180.0).contains(&req.origin_lon) {
        return Err(ApiError::BadRequest(
            "Origin coordinates out of range".to_string(),
        ));
    }

    let plan = HuntPlan::create(&state.db, scope, req).await?;

    Ok(Json(plan))
}

/// Updates a hunt plan
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHuntPlan>,
) -> ApiResult<Json<HuntPlan>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    if let Some(radius) = req.origin_radius_miles {
        if radius <= 0.0 {
            return Err(ApiError::BadRequest(
                "Origin radius must be positive".to_string(),
            ));
        }
    }

    let plan = HuntPlan::update(&state.db, scope, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Hunt plan not found".to_string()))?;

    Ok(Json(plan))
}

/// Deletes a hunt plan
pub async fn delete_plan(
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
        MembershipRole::Dispatcher,
    )
    .await?;

    let deleted = HuntPlan::delete(&state.db, scope, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Hunt plan not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Inbound email payload from the mail provider
#[derive(Debug, Deserialize)]
pub struct InboundEmailRequest {
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Enqueues an inbound email for the worker
///
/// The provider is configured to forward the tenant's hunting mailbox here;
/// the email is queued as-is and parsed asynchronously.
pub async fn inbound_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<InboundEmailRequest>,
) -> ApiResult<Json<InboundEmail>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    if req.from.trim().is_empty() {
        return Err(ApiError::BadRequest("Sender address is required".to_string()));
    }

    let email = InboundEmail::enqueue(
        &state.db,
        scope,
        CreateInboundEmail {
            from_address: req.from,
            subject: req.subject,
            body: req.body,
        },
    )
    .await?;

    Ok(Json(email))
}

/// Queue dashboard filter
#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    /// Filter by state (`pending`, `parsing`, `parsed`, `matched`, `failed`)
    pub state: Option<EmailState>,

    /// Page size (default 50, max 200)
    pub limit: Option<i64>,
}

/// Lists inbound queue rows for the dashboard
pub async fn list_queue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Json<Vec<InboundEmail>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let emails = InboundEmail::list(&state.db, scope, query.state, limit).await?;

    Ok(Json(emails))
}

/// Manually resets a failed queue row back to pending
///
/// The operational affordance for stuck emails: a person looked at the
/// error, fixed whatever was wrong, and pressed the button.
///
/// # Errors
///
/// - `409 Conflict`: the row is not in the `failed` state
pub async fn reset_queue_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InboundEmail>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_role(
        &state.db,
        scope.tenant_id(),
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Dispatcher,
    )
    .await?;

    let existing = InboundEmail::find_by_id(&state.db, scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Queue item not found".to_string()))?;

    let email = InboundEmail::reset(&state.db, scope, id).await?.ok_or_else(|| {
        ApiError::Conflict(format!(
            "Queue item is {}, only failed items can be reset",
            existing.state.as_str()
        ))
    })?;

    Ok(Json(email))
}

/// Match listing filter
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    /// Page size (default 50, max 200)
    pub limit: Option<i64>,
}

/// Lists recent hunt matches
pub async fn list_matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MatchQuery>,
) -> ApiResult<Json<Vec<HuntMatch>>> {
    let scope = effective_scope(&state, &auth).await?;
    authorization::require_membership(&state.db, scope.tenant_id(), auth.user_id, auth.platform_admin)
        .await?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let matches = HuntMatch::list(&state.db, scope, limit).await?;

    Ok(Json(matches))
}
