//! # CyberShield HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (never needs a key)
//! - `POST /users` - Register a reporter (administrators need an administrator caller)
//! - `GET /users/{id}` - User profile
//! - `PUT /users/{id}` - Update name or email (self or administrator)
//! - `GET /users/{id}/incidents` - Incidents reported by a user
//! - `POST /incidents` - Report an incident
//! - `GET /incidents` - The caller's own incidents
//! - `GET /incidents/{id}` - Incident detail
//! - `POST /incidents/{id}/escalate` - Reporter escalation
//! - `GET /admin/incidents` - Filtered listing
//! - `PUT /admin/incidents/{id}/status` - Status change
//! - `POST /admin/incidents/{id}/forward-le` - Forward to law enforcement
//! - `PUT /admin/incidents/{id}/severity` - Set severity
//! - `GET /admin/dashboard` - Dashboard statistics
//! - `GET /admin/law-enforcement` - Law-enforcement queue
//! - `GET /admin/users` - User directory
//!
//! Every route except `/health` and reporter self-registration identifies its
//! caller with the `X-User-Id` header. The first administrator is created
//! from the CLI (`cybershield user add --admin`).

mod auth;
mod error;
mod handlers;
mod middleware;
mod types;

pub use auth::{Caller, USER_ID_HEADER, api_key_matches, resolve_caller};
pub use error::ApiError;
pub use middleware::{REQUEST_ID_HEADER, create_rate_limiter};
pub use types::{
    CreateIncidentRequest, DataResponse, ErrorBody, ErrorDetail, ForwardRequest, HealthResponse,
    IncidentQuery, RegisterUserRequest, SeverityRequest, UpdateProfileRequest, UpdateStatusRequest,
    UserResponse,
};

use crate::config::ServerConfig;
use crate::error::AppError;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use cybershield_core::IncidentService;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Reads share the lock, lifecycle mutations take it exclusively.
    pub service: Arc<RwLock<IncidentService>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(service: IncidentService, config: ServerConfig) -> Self {
        Self {
            service: Arc::new(RwLock::new(service)),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn allowed_headers() -> [HeaderName; 4] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(USER_ID_HEADER),
        middleware::REQUEST_ID_HEADER.clone(),
    ]
}

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

/// Build the CORS layer.
///
/// - `None`: localhost only (restrictive default)
/// - `["*"]`: any origin
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some([only]) if only == "*" => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers(allowed_headers())
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(allowed_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Request id - stamps `X-Request-ID`
/// 2. Tracing - logs all requests
/// 3. CORS - handles preflight requests
/// 4. Body limit
/// 5. Rate limiting (if enabled)
/// 6. API key authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let rate_limiter = if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        Some(create_rate_limiter(config.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = config.api_key().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set CYBERSHIELD_API_KEY or [server] api_key to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/users", post(handlers::register_user_handler))
        .route(
            "/users/{id}",
            get(handlers::get_user_handler).put(handlers::update_profile_handler),
        )
        .route("/users/{id}/incidents", get(handlers::user_incidents_handler))
        .route(
            "/incidents",
            post(handlers::create_incident_handler).get(handlers::my_incidents_handler),
        )
        .route("/incidents/{id}", get(handlers::incident_detail_handler))
        .route("/incidents/{id}/escalate", post(handlers::escalate_handler))
        .route("/admin/incidents", get(handlers::admin_list_handler))
        .route(
            "/admin/incidents/{id}/status",
            put(handlers::update_status_handler),
        )
        .route(
            "/admin/incidents/{id}/forward-le",
            post(handlers::forward_handler),
        )
        .route(
            "/admin/incidents/{id}/severity",
            put(handlers::set_severity_handler),
        )
        .route("/admin/dashboard", get(handlers::dashboard_handler))
        .route("/admin/law-enforcement", get(handlers::law_enforcement_handler))
        .route("/admin/users", get(handlers::list_users_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(config.body_limit_bytes)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(service: IncidentService, config: ServerConfig) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(service, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("CyberShield HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
