/// Application state and router builder
///
/// Shared state is a database pool, the configuration, and the process-wide
/// resolved-flag cache; the router nests one sub-router per concern with the
/// JWT layer applied to everything except health and auth.

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use loadline_shared::auth::{jwt, middleware::AuthContext};
use loadline_shared::flags::FlagCache;
use sqlx::PgPool;
use std::sync::{Arc, RwLock};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor; everything inside
/// is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Process-wide cache of tenant-level flag values
    pub flags: Arc<RwLock<FlagCache>>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            flags: Arc::new(RwLock::new(FlagCache::new())),
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # health check (public)
/// └── /v1/
///     ├── /auth/                    # register, login, refresh (public)
///     ├── /tenants/                 # memberships, selection, members
///     ├── /flags/:key               # effective gate check
///     ├── /admin/                   # flags, overrides, grants, impersonation
///     ├── /fleet/                   # carriers, drivers, vehicles
///     ├── /loads/                   # load board and lifecycle
///     ├── /hunter/                  # hunt plans, inbound queue, matches
///     └── /reports/                 # revenue, driver pay
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let tenant_routes = Router::new()
        .route("/", get(routes::tenants::list_memberships))
        .route("/select", post(routes::tenants::select_tenant))
        .route("/:id/members", get(routes::tenants::list_members))
        .route("/:id/members/:user_id", put(routes::tenants::assign_role))
        .route("/:id/members/:user_id", delete(routes::tenants::remove_member));

    let flag_routes = Router::new().route("/:key", get(routes::flags::check_flag));

    let admin_routes = Router::new()
        .route("/flags", get(routes::admin::list_flags))
        .route("/flags", post(routes::admin::upsert_flag))
        .route("/flags/:key", delete(routes::admin::delete_flag))
        .route("/flags/:key/overrides", post(routes::admin::set_override))
        .route("/flags/:key/overrides/:tenant_id", delete(routes::admin::clear_override))
        .route("/flags/:key/grants", post(routes::admin::grant_flag))
        .route("/flags/:key/grants/:user_id", delete(routes::admin::revoke_grant))
        .route("/impersonations", post(routes::admin::start_impersonation))
        .route("/impersonations/:id/stop", post(routes::admin::stop_impersonation));

    let fleet_routes = Router::new()
        .route("/carriers", get(routes::fleet::carriers::list))
        .route("/carriers", post(routes::fleet::carriers::create))
        .route("/carriers/:id", get(routes::fleet::carriers::get_by_id))
        .route("/carriers/:id", put(routes::fleet::carriers::update))
        .route("/carriers/:id", delete(routes::fleet::carriers::remove))
        .route("/drivers", get(routes::fleet::drivers::list))
        .route("/drivers", post(routes::fleet::drivers::create))
        .route("/drivers/:id", get(routes::fleet::drivers::get_by_id))
        .route("/drivers/:id", put(routes::fleet::drivers::update))
        .route("/drivers/:id", delete(routes::fleet::drivers::remove))
        .route("/vehicles", get(routes::fleet::vehicles::list))
        .route("/vehicles", post(routes::fleet::vehicles::create))
        .route("/vehicles/:id", get(routes::fleet::vehicles::get_by_id))
        .route("/vehicles/:id", put(routes::fleet::vehicles::update))
        .route("/vehicles/:id", delete(routes::fleet::vehicles::remove))
        .route("/vehicles/:id/driver", put(routes::fleet::vehicles::assign_driver));

    let load_routes = Router::new()
        .route("/", get(routes::loads::list))
        .route("/", post(routes::loads::create))
        .route("/:id", get(routes::loads::get_by_id))
        .route("/:id", put(routes::loads::update))
        .route("/:id", delete(routes::loads::remove))
        .route("/:id/assign", post(routes::loads::assign))
        .route("/:id/status", post(routes::loads::transition_status));

    let hunter_routes = Router::new()
        .route("/plans", get(routes::hunter::list_plans))
        .route("/plans", post(routes::hunter::create_plan))
        .route("/plans/:id", put(routes::hunter::update_plan))
        .route("/plans/:id", delete(routes::hunter::delete_plan))
        .route("/inbound", post(routes::hunter::inbound_webhook))
        .route("/queue", get(routes::hunter::list_queue))
        .route("/queue/:id/reset", post(routes::hunter::reset_queue_item))
        .route("/matches", get(routes::hunter::list_matches));

    let report_routes = Router::new()
        .route("/revenue", get(routes::reports::revenue_summary))
        .route("/driver-pay/:driver_id", get(routes::reports::driver_pay));

    // Everything except health and auth requires a valid access token.
    let protected = Router::new()
        .nest("/tenants", tenant_routes)
        .nest("/flags", flag_routes)
        .nest("/admin", admin_routes)
        .nest("/fleet", fleet_routes)
        .nest("/loads", load_routes)
        .nest("/hunter", hunter_routes)
        .nest("/reports", report_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer token and injects an [`AuthContext`] into request
/// extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
