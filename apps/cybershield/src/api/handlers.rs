//! # API Endpoint Handlers
//!
//! Each handler extracts the caller, parses the request, and delegates to
//! `IncidentService`. Lifecycle mutations log a structured `info!` event.
//!
//! Anyone holding the API key may register a reporter. Registering an
//! administrator requires an administrator caller.

use super::{
    AppState,
    auth::{Caller, resolve_caller},
    error::ApiError,
    types::{
        CreateIncidentRequest, DataResponse, ForwardRequest, HealthResponse, IncidentQuery,
        RegisterUserRequest, SeverityRequest, UpdateProfileRequest, UpdateStatusRequest,
        UserResponse,
    },
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use cybershield_core::{
    CyberShieldError, DashboardStats, Incident, IncidentId, Lifecycle, Role, Severity, UserId,
};

type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(DataResponse::new(data)))
}

fn incident_id(raw: &str) -> Result<IncidentId, ApiError> {
    raw.parse().map_err(ApiError::from)
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// USER HANDLERS
// =============================================================================

/// Register a reporter or administrator.
pub async fn register_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<UserResponse>>), ApiError> {
    let Json(request) = payload?;
    let registration = request.into_registration()?;
    if matches!(registration.role, Role::Administrator { .. }) {
        let caller = resolve_caller(&headers, &state).await?;
        Lifecycle::require_admin(&caller, "register_administrator")?;
    }

    let mut service = state.service.write().await;
    let user = service.register_user(registration)?;
    tracing::info!(user_id = %user.id, role = user.role.label(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(UserResponse::from(user))),
    ))
}

/// User profile.
pub async fn get_user_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let service = state.service.read().await;
    ok(service.get_user(&UserId::new(id))?.into())
}

/// Change a user's name or email.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload?;
    let user_id = UserId::new(id);

    let mut service = state.service.write().await;
    let user = service.update_profile(&caller, &user_id, request.into())?;
    tracing::info!(user_id = %user_id, actor = %caller.id(), "Profile updated");
    ok(user.into())
}

/// Incidents reported by a user. Reporters may only list their own.
pub async fn user_incidents_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Vec<Incident>> {
    let user_id = UserId::new(id);
    if !caller.is_admin() && caller.id() != &user_id {
        return Err(CyberShieldError::Authorization(format!(
            "{} may not list incidents of {}",
            caller.id(),
            user_id
        ))
        .into());
    }

    let service = state.service.read().await;
    service.get_user(&user_id)?;
    ok(service.list_reporter_incidents(&user_id)?)
}

// =============================================================================
// REPORTER HANDLERS
// =============================================================================

/// Report a new incident.
pub async fn create_incident_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<CreateIncidentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Incident>>), ApiError> {
    let Json(request) = payload?;
    let draft = request.into_draft()?;

    let mut service = state.service.write().await;
    let incident = service.create_incident(&caller, draft)?;
    tracing::info!(
        incident_id = %incident.id,
        actor = %caller.id(),
        severity = %incident.severity,
        category = %incident.category,
        "Incident reported"
    );

    Ok((StatusCode::CREATED, Json(DataResponse::new(incident))))
}

/// The caller's own incidents.
pub async fn my_incidents_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Vec<Incident>> {
    let service = state.service.read().await;
    ok(service.list_reporter_incidents(caller.id())?)
}

/// View one incident.
pub async fn incident_detail_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Incident> {
    let id = incident_id(&id)?;
    let service = state.service.read().await;
    ok(service.view_incident_detail(id)?)
}

/// Reporter escalation to `emergency`.
pub async fn escalate_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Incident> {
    let id = incident_id(&id)?;
    let mut service = state.service.write().await;
    let incident = service.escalate_incident(&caller, id)?;
    tracing::info!(incident_id = %id, actor = %caller.id(), "Incident escalated");
    ok(incident)
}

// =============================================================================
// ADMINISTRATOR HANDLERS
// =============================================================================

/// Filtered incident listing.
pub async fn admin_list_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> ApiResult<Vec<Incident>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let service = state.service.read().await;
    ok(service.list_incidents(&caller, &filter)?)
}

pub async fn update_status_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Incident> {
    Lifecycle::require_admin(&caller, "update_status")?;
    let id = incident_id(&id)?;
    let Json(request) = payload?;
    let change = request.into_change()?;
    let to = change.status;

    let mut service = state.service.write().await;
    let before = service.view_incident_detail(id).map(|i| i.status).ok();
    let incident = service.update_status(&caller, id, change)?;
    tracing::info!(
        incident_id = %id,
        actor = %caller.id(),
        from = before.map(|s| s.as_str()).unwrap_or("unknown"),
        to = %to,
        "Incident status updated"
    );
    ok(incident)
}

pub async fn forward_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    payload: Result<Json<ForwardRequest>, JsonRejection>,
) -> ApiResult<Incident> {
    Lifecycle::require_admin(&caller, "forward_to_law_enforcement")?;
    let id = incident_id(&id)?;
    let Json(request) = payload?;

    let mut service = state.service.write().await;
    let incident = service.forward_to_law_enforcement(&caller, id, &request.law_enforcement_ref)?;
    tracing::info!(
        incident_id = %id,
        actor = %caller.id(),
        to = %incident.status,
        "Incident forwarded to law enforcement"
    );
    ok(incident)
}

pub async fn set_severity_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    payload: Result<Json<SeverityRequest>, JsonRejection>,
) -> ApiResult<Incident> {
    Lifecycle::require_admin(&caller, "set_severity")?;
    let id = incident_id(&id)?;
    let Json(request) = payload?;
    let severity: Severity = request.severity.parse()?;

    let mut service = state.service.write().await;
    let incident = service.set_severity(&caller, id, severity)?;
    tracing::info!(incident_id = %id, actor = %caller.id(), severity = %severity, "Severity set");
    ok(incident)
}

/// Dashboard statistics.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<DashboardStats> {
    let service = state.service.read().await;
    ok(service.dashboard(&caller)?)
}

/// Law-enforcement queue.
pub async fn law_enforcement_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Vec<Incident>> {
    let service = state.service.read().await;
    ok(service.law_enforcement_queue(&caller)?)
}

/// User directory.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Vec<UserResponse>> {
    Lifecycle::require_admin(&caller, "list_users")?;
    let service = state.service.read().await;
    ok(service
        .list_users()?
        .into_iter()
        .map(UserResponse::from)
        .collect())
}
