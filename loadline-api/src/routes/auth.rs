/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register, creating the user's first tenant
/// - `POST /v1/auth/login` - Login; session tenant resolved by selection
///   priority
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use loadline_shared::{
    auth::{jwt, password},
    models::{
        membership::{CreateMembership, Membership, MembershipRole},
        tenant::{ReleaseChannel, Tenant},
        user::{CreateUser, User},
    },
    tenancy::{SessionContext, TenantSelection},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Company name for the new tenant
    #[validate(length(min = 1, max = 100, message = "Company name must be 1-100 characters"))]
    pub company: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// User ID
    pub user_id: String,

    /// Tenant ID
    pub tenant_id: String,

    /// Tenant slug
    pub tenant_slug: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Session tenant resolved by selection priority
    pub tenant_id: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Register a new user with their first tenant
///
/// Creates the account, a tenant slugged from the company name, an owner
/// membership, and persists the tenant selection.
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.clone(),
            password_hash,
            name: req.name.clone(),
        },
    )
    .await?;

    let tenant =
        Tenant::create_with_unique_slug(&state.db, req.company, ReleaseChannel::General).await?;

    Membership::create(
        &state.db,
        CreateMembership {
            tenant_id: tenant.id,
            user_id: user.id,
            role: MembershipRole::Owner,
        },
    )
    .await?;

    TenantSelection::store(&state.db, user.id, tenant.id).await?;

    let access_claims = jwt::Claims::new(user.id, tenant.id, false, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, tenant.id, false, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(RegisterResponse {
        user_id: user.id.to_string(),
        tenant_id: tenant.id.to_string(),
        tenant_slug: tenant.slug,
        access_token,
        refresh_token,
    }))
}

/// Login endpoint
///
/// Authenticates and starts a session: the session tenant comes out of the
/// tenancy selection priority (stored selection, sole membership, `default`
/// slug, first membership).
///
/// # Errors
///
/// - `401 Unauthorized`: invalid credentials
/// - `403 Forbidden`: user has no tenant membership
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let session = SessionContext::start(&state.db, user.id).await?;
    let tenant_id = session
        .effective_tenant()
        .ok_or_else(|| ApiError::Forbidden("No tenant membership".to_string()))?;

    User::update_last_login(&state.db, user.id).await?;

    let access_claims =
        jwt::Claims::new(user.id, tenant_id, user.platform_admin, jwt::TokenType::Access);
    let refresh_claims =
        jwt::Claims::new(user.id, tenant_id, user.platform_admin, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        tenant_id: tenant_id.to_string(),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
