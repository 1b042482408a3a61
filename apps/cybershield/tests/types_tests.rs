//! Tests for the HTTP request/response types.

#![allow(clippy::unwrap_used)]

use cybershield::api::{
    CreateIncidentRequest, DataResponse, IncidentQuery, RegisterUserRequest, UpdateProfileRequest,
    UpdateStatusRequest, UserResponse,
};
use cybershield_core::{
    Category, CyberShieldError, IncidentStatus, ProfileUpdate, Role, Severity, UserId,
    primitives::MAX_LIST_LIMIT,
};
use serde_json::json;

#[test]
fn register_request_defaults_to_reporter() {
    let request: RegisterUserRequest =
        serde_json::from_value(json!({"id": "U1", "email": "u1@example.com", "name": "Ann"}))
            .unwrap();
    assert_eq!(request.role, "user");

    let registration = request.into_registration().unwrap();
    assert_eq!(registration.role, Role::Reporter);
}

#[test]
fn register_request_admin_carries_badge() {
    let request: RegisterUserRequest = serde_json::from_value(json!({
        "id": "A1",
        "email": "a1@agency.gov",
        "name": "Officer",
        "role": "admin",
        "badge_number": "B-7",
        "department": "Fraud",
    }))
    .unwrap();

    let registration = request.into_registration().unwrap();
    assert_eq!(
        registration.role,
        Role::Administrator {
            badge_number: "B-7".to_string(),
            department: "Fraud".to_string(),
        }
    );
}

#[test]
fn register_request_unknown_role_is_rejected() {
    let request: RegisterUserRequest = serde_json::from_value(json!({
        "id": "X",
        "email": "x@example.com",
        "name": "X",
        "role": "superuser",
    }))
    .unwrap();
    assert!(matches!(
        request.into_registration(),
        Err(CyberShieldError::Validation(_))
    ));
}

#[test]
fn create_request_parses_labels() {
    let request = CreateIncidentRequest {
        title: "Ransom note".to_string(),
        description: "Files encrypted".to_string(),
        category: "ransomware".to_string(),
        severity: "high".to_string(),
    };
    let draft = request.into_draft().unwrap();
    assert_eq!(draft.category, Category::Ransomware);
    assert_eq!(draft.severity, Severity::High);
}

#[test]
fn status_request_keeps_optional_fields() {
    let request: UpdateStatusRequest = serde_json::from_value(json!({
        "status": "forwarded_to_le",
        "law_enforcement_ref": "LE-9",
        "assigned_to": "A1",
    }))
    .unwrap();

    let change = request.into_change().unwrap();
    assert_eq!(change.status, IncidentStatus::ForwardedToLe);
    assert_eq!(change.law_enforcement_ref.as_deref(), Some("LE-9"));
    assert_eq!(change.assigned_to, Some(UserId::new("A1")));
    assert!(change.admin_notes.is_none());
}

#[test]
fn status_request_unknown_status_is_rejected() {
    let request: UpdateStatusRequest =
        serde_json::from_value(json!({"status": "archived"})).unwrap();
    assert!(request.into_change().is_err());
}

#[test]
fn query_splits_comma_lists() {
    let query = IncidentQuery {
        status: Some("pending, reviewing".to_string()),
        severity: Some("emergency".to_string()),
        category: Some("phishing,,malware".to_string()),
        search: Some("bank".to_string()),
        limit: Some(10),
        ..IncidentQuery::default()
    };

    let filter = query.into_filter().unwrap();
    assert_eq!(
        filter.status,
        vec![IncidentStatus::Pending, IncidentStatus::Reviewing]
    );
    assert_eq!(filter.severity, vec![Severity::Emergency]);
    assert_eq!(filter.category, vec![Category::Phishing, Category::Malware]);
    assert_eq!(filter.search.as_deref(), Some("bank"));
    assert_eq!(filter.limit, Some(10));
}

#[test]
fn query_rejects_bad_limits_and_labels() {
    for limit in [0, MAX_LIST_LIMIT + 1] {
        let query = IncidentQuery {
            limit: Some(limit),
            ..IncidentQuery::default()
        };
        assert!(query.into_filter().is_err());
    }

    let query = IncidentQuery {
        category: Some("phishing,spam".to_string()),
        ..IncidentQuery::default()
    };
    assert!(query.into_filter().is_err());
}

#[test]
fn empty_query_matches_everything() {
    let filter = IncidentQuery::default().into_filter().unwrap();
    assert!(filter.status.is_empty());
    assert!(filter.reporter.is_none());
    assert!(filter.limit.is_none());
}

#[test]
fn data_response_envelope() {
    let user = UserResponse {
        id: "U1".to_string(),
        email: "u1@example.com".to_string(),
        name: "Ann".to_string(),
        role: "user".to_string(),
        badge_number: None,
        department: None,
        created_at: "2024-01-01T00:00:00+00:00".to_string(),
    };
    let value = serde_json::to_value(DataResponse::new(user)).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["role"], "user");
    assert!(value["data"]["badge_number"].is_null());
}

#[test]
fn profile_request_accepts_name_and_email_only() {
    let request: UpdateProfileRequest =
        serde_json::from_value(json!({"email": "new@example.com"})).unwrap();
    let update = ProfileUpdate::from(request);
    assert!(update.name.is_none());
    assert_eq!(update.email.as_deref(), Some("new@example.com"));

    let with_role = serde_json::from_value::<UpdateProfileRequest>(json!({
        "name": "Jane",
        "role": "admin",
    }));
    assert!(with_role.is_err());
}
