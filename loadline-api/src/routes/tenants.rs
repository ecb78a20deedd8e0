/// Tenant membership and selection endpoints
///
/// # Endpoints
///
/// - `GET /v1/tenants` - My memberships plus the current selection
/// - `POST /v1/tenants/select` - Switch the persisted selection
/// - `GET /v1/tenants/:id/members` - List members
/// - `PUT /v1/tenants/:id/members/:user_id` - Assign a role
/// - `DELETE /v1/tenants/:id/members/:user_id` - Remove a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use loadline_shared::{
    auth::{authorization, jwt, middleware::AuthContext},
    models::membership::{Membership, MembershipRole, MembershipWithTenant},
    tenancy::SessionContext,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One membership row in the listing
#[derive(Debug, Serialize)]
pub struct MembershipView {
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_slug: String,
    pub role: MembershipRole,
}

impl From<&MembershipWithTenant> for MembershipView {
    fn from(m: &MembershipWithTenant) -> Self {
        Self {
            tenant_id: m.tenant_id.to_string(),
            tenant_name: m.tenant_name.clone(),
            tenant_slug: m.tenant_slug.clone(),
            role: m.role,
        }
    }
}

/// Memberships response
#[derive(Debug, Serialize)]
pub struct MembershipsResponse {
    /// The user's memberships, in creation order
    pub memberships: Vec<MembershipView>,

    /// Currently selected tenant, after resolution
    pub selected_tenant_id: Option<String>,

    /// Whether an impersonation override is in force
    pub impersonating: bool,
}

/// Lists the caller's memberships and current selection
pub async fn list_memberships(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MembershipsResponse>> {
    let session = SessionContext::start(&state.db, auth.user_id).await?;

    Ok(Json(MembershipsResponse {
        memberships: session.memberships.iter().map(MembershipView::from).collect(),
        selected_tenant_id: session.selected_tenant().map(|id| id.to_string()),
        impersonating: session.is_impersonating(),
    }))
}

/// Select request
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Tenant to switch to
    pub tenant_id: Uuid,
}

/// Select response
#[derive(Debug, Serialize)]
pub struct SelectResponse {
    /// Newly selected tenant
    pub tenant_id: String,

    /// Fresh access token carrying the new tenant
    pub access_token: String,
}

/// Switches the caller's persisted tenant selection
///
/// Access tokens carry the session tenant, so a successful switch returns a
/// fresh token.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a member of the target tenant
pub async fn select_tenant(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SelectRequest>,
) -> ApiResult<Json<SelectResponse>> {
    let mut session = SessionContext::start(&state.db, auth.user_id).await?;
    session.switch_tenant(&state.db, req.tenant_id).await?;

    let claims = jwt::Claims::new(
        auth.user_id,
        req.tenant_id,
        session.user.platform_admin,
        jwt::TokenType::Access,
    );
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(SelectResponse {
        tenant_id: req.tenant_id.to_string(),
        access_token,
    }))
}

/// Lists members of a tenant
///
/// Requires admin in the tenant (platform admins pass).
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(tenant_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    authorization::require_role(
        &state.db,
        tenant_id,
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Admin,
    )
    .await?;

    let members = Membership::list_by_tenant(&state.db, tenant_id).await?;

    Ok(Json(members))
}

/// Role assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// New role for the member
    pub role: MembershipRole,
}

/// Assigns a role to a member
///
/// Requires admin in the tenant. Owners can only be (re)assigned by another
/// owner.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let required = if req.role == MembershipRole::Owner {
        MembershipRole::Owner
    } else {
        MembershipRole::Admin
    };

    authorization::require_role(
        &state.db,
        tenant_id,
        auth.user_id,
        auth.platform_admin,
        required,
    )
    .await?;

    let membership = Membership::update_role(&state.db, tenant_id, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Membership not found".to_string()))?;

    Ok(Json(membership))
}

/// Removes a member from a tenant
///
/// Requires admin in the tenant; members cannot remove themselves.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot remove your own membership".to_string(),
        ));
    }

    authorization::require_role(
        &state.db,
        tenant_id,
        auth.user_id,
        auth.platform_admin,
        MembershipRole::Admin,
    )
    .await?;

    let removed = Membership::delete(&state.db, tenant_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "removed": true })))
}
