//! # Lifecycle Scenarios
//!
//! End-to-end flows through `IncidentService` on both storage backends.

#![allow(clippy::unwrap_used, clippy::panic)]

use cybershield_core::{
    CyberShieldError, IncidentFilter, IncidentService, IncidentStatus, NewIncident, Principal,
    Severity, StatusChange, UserId, UserRegistration,
};
use tempfile::tempdir;

fn register_all(service: &mut IncidentService) -> (Principal, Principal, Principal) {
    let u1 = service
        .register_user(UserRegistration::reporter("U1", "u1@example.com", "First Reporter"))
        .unwrap()
        .principal();
    let u2 = service
        .register_user(UserRegistration::reporter("U2", "u2@example.com", "Second Reporter"))
        .unwrap()
        .principal();
    let a1 = service
        .register_user(UserRegistration::administrator(
            "A1",
            "a1@agency.gov",
            "Duty Officer",
            "B-1001",
            "Cybercrime Unit",
        ))
        .unwrap()
        .principal();
    (u1, u2, a1)
}

fn phishing_report() -> NewIncident {
    NewIncident::from_labels("Phishing email", "Received fake bank email", "phishing", "low").unwrap()
}

#[test]
fn reporter_creates_pending_incident() {
    let mut service = IncidentService::new();
    let (u1, _, _) = register_all(&mut service);

    let incident = service.create_incident(&u1, phishing_report()).unwrap();
    assert_eq!(incident.status, IncidentStatus::Pending);
    assert_eq!(incident.user_id, UserId::new("U1"));
    assert_eq!(incident.severity, Severity::Low);
    assert!(incident.law_enforcement_ref.is_none());
    assert!(incident.last_updated_by.is_none());
}

#[test]
fn forwarding_status_without_reference_is_rejected() {
    let mut service = IncidentService::new();
    let (u1, _, a1) = register_all(&mut service);
    let incident = service.create_incident(&u1, phishing_report()).unwrap();

    let err = service
        .update_status(&a1, incident.id, StatusChange::to(IncidentStatus::ForwardedToLe))
        .unwrap_err();
    assert!(matches!(err, CyberShieldError::Validation(_)));

    let stored = service.view_incident_detail(incident.id).unwrap();
    assert_eq!(stored.status, IncidentStatus::Pending);
    assert_eq!(stored.revision, 0);
}

#[test]
fn administrator_forwards_pending_incident() {
    let mut service = IncidentService::new();
    let (u1, _, a1) = register_all(&mut service);
    let incident = service.create_incident(&u1, phishing_report()).unwrap();

    let forwarded = service
        .forward_to_law_enforcement(&a1, incident.id, "LE-2024-001")
        .unwrap();
    assert_eq!(forwarded.status, IncidentStatus::ForwardedToLe);
    assert_eq!(forwarded.law_enforcement_ref.as_deref(), Some("LE-2024-001"));
    assert!(forwarded.forwarded_at.is_some());
    assert_eq!(forwarded.last_updated_by, Some(UserId::new("A1")));
    assert_eq!(forwarded.history.len(), 1);
    assert_eq!(forwarded.history[0].old_status, IncidentStatus::Pending);
}

#[test]
fn reporter_cannot_escalate_someone_elses_incident() {
    let mut service = IncidentService::new();
    let (u1, u2, _) = register_all(&mut service);
    let incident = service.create_incident(&u2, phishing_report()).unwrap();

    let err = service.escalate_incident(&u1, incident.id).unwrap_err();
    assert!(matches!(err, CyberShieldError::Authorization(_)));
    assert_eq!(
        service.view_incident_detail(incident.id).unwrap().severity,
        Severity::Low
    );
}

#[test]
fn full_lifecycle_then_closed_rejects_everything() {
    let mut service = IncidentService::new();
    let (u1, _, a1) = register_all(&mut service);
    let id = service.create_incident(&u1, phishing_report()).unwrap().id;

    service.escalate_incident(&u1, id).unwrap();
    service
        .update_status(
            &a1,
            id,
            StatusChange::to(IncidentStatus::Reviewing)
                .with_notes("Contacted bank")
                .with_assignee(UserId::new("A1")),
        )
        .unwrap();
    service
        .update_status(&a1, id, StatusChange::to(IncidentStatus::Resolved))
        .unwrap();
    let closed = service
        .update_status(&a1, id, StatusChange::to(IncidentStatus::Closed))
        .unwrap();
    assert_eq!(closed.history.len(), 3);
    assert_eq!(closed.admin_notes.as_deref(), Some("Contacted bank"));
    assert!(closed.resolved_at.is_some());

    let conflicts = [
        service
            .update_status(&a1, id, StatusChange::to(IncidentStatus::Reviewing))
            .unwrap_err(),
        service.forward_to_law_enforcement(&a1, id, "LE-1").unwrap_err(),
        service.set_severity(&a1, id, Severity::Low).unwrap_err(),
        service.escalate_incident(&u1, id).unwrap_err(),
    ];
    for err in conflicts {
        assert!(matches!(err, CyberShieldError::Conflict(_)), "{err:?}");
    }
}

#[test]
fn admin_listing_filters() {
    let mut service = IncidentService::new();
    let (u1, u2, a1) = register_all(&mut service);
    service.create_incident(&u1, phishing_report()).unwrap();
    service
        .create_incident(
            &u2,
            NewIncident::from_labels("Locked laptop", "Ransom demand on screen", "ransomware", "high")
                .unwrap(),
        )
        .unwrap();

    let high = service
        .list_incidents(&a1, &IncidentFilter::all().with_severity(Severity::High))
        .unwrap();
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].user_id, UserId::new("U2"));

    let search = service
        .list_incidents(&a1, &IncidentFilter::all().with_search("BANK"))
        .unwrap();
    assert_eq!(search.len(), 1);

    assert_eq!(service.list_reporter_incidents(&UserId::new("U1")).unwrap().len(), 1);
}

#[test]
fn duplicate_user_is_conflict() {
    let mut service = IncidentService::new();
    register_all(&mut service);
    let err = service
        .register_user(UserRegistration::reporter("U1", "other@example.com", "Someone"))
        .unwrap_err();
    assert!(matches!(err, CyberShieldError::Conflict(_)));
}

#[test]
fn redb_service_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cybershield.db");

    let id = {
        let mut service = IncidentService::with_redb(&path).unwrap();
        assert!(service.is_persistent());
        let (u1, _, a1) = register_all(&mut service);
        let id = service.create_incident(&u1, phishing_report()).unwrap().id;
        service.forward_to_law_enforcement(&a1, id, "LE-7").unwrap();
        id
    };

    let service = IncidentService::with_redb(&path).unwrap();
    let incident = service.view_incident_detail(id).unwrap();
    assert_eq!(incident.status, IncidentStatus::ForwardedToLe);
    assert_eq!(incident.revision, 1);
    assert_eq!(service.incident_count().unwrap(), 1);
    assert!(service.principal(&UserId::new("A1")).unwrap().is_admin());
}
