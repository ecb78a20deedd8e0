/// Request authentication context
///
/// After the API's JWT layer validates a Bearer token it inserts an
/// [`AuthContext`] into the request extensions; handlers extract it to know
/// who is calling and which tenant their session resolved to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::tenancy::TenantScope;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Tenant resolved at token issue time
    pub tenant_id: Uuid,

    /// Platform-admin status at token issue time
    pub platform_admin: bool,
}

impl AuthContext {
    /// Builds the context from validated claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            platform_admin: claims.platform_admin,
        }
    }

    /// Scope for the token's tenant
    ///
    /// Handlers that honor impersonation resolve the effective scope through
    /// the tenancy layer instead; this is the plain, non-overridden scope.
    pub fn scope(&self) -> TenantScope {
        TenantScope::new(self.tenant_id)
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), true, TokenType::Access);
        let context = AuthContext::from_claims(&claims);

        assert_eq!(context.user_id, claims.sub);
        assert_eq!(context.tenant_id, claims.tenant_id);
        assert!(context.platform_admin);
        assert_eq!(context.scope().tenant_id(), claims.tenant_id);
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidToken("bad".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
