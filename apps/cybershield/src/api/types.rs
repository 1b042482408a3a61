//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Enumerations
//! arrive as strings and are parsed here, so an unknown label becomes a
//! `VALIDATION_ERROR` rather than a framework rejection.

use cybershield_core::{
    CyberShieldError, IncidentFilter, NewIncident, ProfileUpdate, Role, StatusChange, User,
    UserId, UserRegistration, primitives::MAX_LIST_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// ENVELOPES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Successful response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failed response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// =============================================================================
// USERS
// =============================================================================

/// User registration request.
///
/// `role` is `user` or `admin`; administrators must carry a badge number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub badge_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

fn default_role() -> String {
    "user".to_string()
}

impl RegisterUserRequest {
    pub fn into_registration(self) -> Result<UserRegistration, CyberShieldError> {
        match self.role.trim() {
            "user" | "reporter" => Ok(UserRegistration::reporter(self.id, self.email, self.name)),
            "admin" | "administrator" => Ok(UserRegistration::administrator(
                self.id,
                self.email,
                self.name,
                self.badge_number.unwrap_or_default(),
                self.department.unwrap_or_default(),
            )),
            other => Err(CyberShieldError::Validation(format!(
                "Unknown role: '{}'",
                other
            ))),
        }
    }
}

/// Profile change. Only `name` and `email` may be sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub badge_number: Option<String>,
    pub department: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let role = user.role.label().to_string();
        let (badge_number, department) = match user.role {
            Role::Reporter => (None, None),
            Role::Administrator {
                badge_number,
                department,
            } => (Some(badge_number), Some(department)),
        };
        Self {
            id: user.id.0,
            email: user.email,
            name: user.name,
            role,
            badge_number,
            department,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// INCIDENTS
// =============================================================================

/// New incident report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIncidentRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: String,
}

impl CreateIncidentRequest {
    pub fn into_draft(self) -> Result<NewIncident, CyberShieldError> {
        NewIncident::from_labels(self.title, self.description, &self.category, &self.severity)
    }
}

/// Administrator status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub law_enforcement_ref: Option<String>,
}

impl UpdateStatusRequest {
    pub fn into_change(self) -> Result<StatusChange, CyberShieldError> {
        let mut change = StatusChange::to(self.status.parse()?);
        if let Some(notes) = self.admin_notes {
            change = change.with_notes(notes);
        }
        if let Some(assignee) = self.assigned_to {
            change = change.with_assignee(UserId::new(assignee));
        }
        if let Some(reference) = self.law_enforcement_ref {
            change = change.with_reference(reference);
        }
        Ok(change)
    }
}

/// Forward-to-law-enforcement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardRequest {
    pub law_enforcement_ref: String,
}

/// Administrator severity change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityRequest {
    pub severity: String,
}

/// Query string of the administrator listing.
///
/// `status`, `severity` and `category` accept comma-separated lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub reporter: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

fn parse_list<T: FromStr<Err = CyberShieldError>>(
    raw: Option<&str>,
) -> Result<Vec<T>, CyberShieldError> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<T>)
            .collect()
    })
    .unwrap_or_else(|| Ok(Vec::new()))
}

impl IncidentQuery {
    pub fn into_filter(self) -> Result<IncidentFilter, CyberShieldError> {
        if self.limit.is_some_and(|l| l == 0 || l > MAX_LIST_LIMIT) {
            return Err(CyberShieldError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_LIST_LIMIT
            )));
        }
        Ok(IncidentFilter {
            status: parse_list(self.status.as_deref())?,
            severity: parse_list(self.severity.as_deref())?,
            category: parse_list(self.category.as_deref())?,
            assigned_to: self.assigned_to.map(UserId::new),
            reporter: self.reporter.map(UserId::new),
            search: self.search,
            limit: self.limit,
        })
    }
}
