//! # Incident Lifecycle
//!
//! The status state machine and the role rules for every incident mutation.
//!
//! ```text
//!   pending ──► reviewing ──► resolved ──► forwarded_to_le
//!      │            │            │               │
//!      └────────────┴─────┬──────┴───────────────┘
//!                         ▼
//!                       closed  (terminal)
//! ```
//!
//! `pending` may also jump straight to `resolved` or `forwarded_to_le`, and
//! `reviewing` straight to `forwarded_to_le`.
//!
//! All rules are pure: they take the current record, the acting principal and
//! the current time, and either mutate the record or return an error without
//! touching it. Persistence is the caller's job (see `service`).

use crate::primitives::{
    MAX_DESCRIPTION_LENGTH, MAX_NOTES_LENGTH, MAX_REFERENCE_LENGTH, MAX_TITLE_LENGTH,
};
use crate::{
    Category, CyberShieldError, Incident, IncidentId, IncidentStatus, IncidentUpdate, Principal,
    Severity, Timestamp, UserId,
};

// =============================================================================
// INPUTS
// =============================================================================

/// Reporter-supplied fields of a new incident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
}

impl NewIncident {
    /// Build a draft from wire labels, rejecting unknown category or severity.
    pub fn from_labels(
        title: impl Into<String>,
        description: impl Into<String>,
        category: &str,
        severity: &str,
    ) -> Result<Self, CyberShieldError> {
        Ok(Self {
            title: title.into(),
            description: description.into(),
            category: category.parse()?,
            severity: severity.parse()?,
        })
    }
}

/// An administrator's requested status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: IncidentStatus,
    pub admin_notes: Option<String>,
    pub assigned_to: Option<UserId>,
    /// Required when `status` is `forwarded_to_le`, rejected otherwise.
    pub law_enforcement_ref: Option<String>,
}

impl StatusChange {
    /// A bare status change with no notes, assignment or reference.
    #[must_use]
    pub fn to(status: IncidentStatus) -> Self {
        Self {
            status,
            admin_notes: None,
            assigned_to: None,
            law_enforcement_ref: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.admin_notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assigned_to = Some(assignee);
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.law_enforcement_ref = Some(reference.into());
        self
    }
}

// =============================================================================
// LIFECYCLE RULES
// =============================================================================

/// Stateless rule set for incident mutations.
pub struct Lifecycle;

impl Lifecycle {
    /// Whether `from → to` is an edge of the lifecycle graph.
    #[must_use]
    pub const fn can_transition(from: IncidentStatus, to: IncidentStatus) -> bool {
        use IncidentStatus::{Closed, ForwardedToLe, Pending, Resolved, Reviewing};
        matches!(
            (from, to),
            (Pending, Reviewing)
                | (Pending | Reviewing, Resolved)
                | (Pending | Reviewing | Resolved, ForwardedToLe)
                | (Pending | Reviewing | Resolved | ForwardedToLe, Closed)
        )
    }

    /// Every status reachable from `from` in one step.
    #[must_use]
    pub fn allowed_transitions(from: IncidentStatus) -> Vec<IncidentStatus> {
        IncidentStatus::ALL
            .iter()
            .copied()
            .filter(|to| Self::can_transition(from, *to))
            .collect()
    }

    /// Reject anyone but an administrator.
    pub fn require_admin(principal: &Principal, action: &str) -> Result<(), CyberShieldError> {
        match principal {
            Principal::Administrator { .. } => Ok(()),
            Principal::Reporter(id) => Err(CyberShieldError::Authorization(format!(
                "{} requires an administrator (caller: {})",
                action, id
            ))),
        }
    }

    /// Trim a law-enforcement reference, rejecting blank or oversized values.
    pub fn validate_reference(reference: &str) -> Result<String, CyberShieldError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(CyberShieldError::Validation(
                "law_enforcement_ref is required to forward an incident".to_string(),
            ));
        }
        if trimmed.len() > MAX_REFERENCE_LENGTH {
            return Err(CyberShieldError::Validation(format!(
                "law_enforcement_ref length {} exceeds maximum {} bytes",
                trimmed.len(),
                MAX_REFERENCE_LENGTH
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Create a new pending incident owned by the calling reporter.
    pub fn create(
        reporter: &Principal,
        draft: NewIncident,
        id: IncidentId,
        now: Timestamp,
    ) -> Result<Incident, CyberShieldError> {
        let Principal::Reporter(user_id) = reporter else {
            return Err(CyberShieldError::Authorization(
                "Incidents are reported by reporters, not administrators".to_string(),
            ));
        };

        let title = required_text("title", &draft.title, MAX_TITLE_LENGTH)?;
        let description = required_text("description", &draft.description, MAX_DESCRIPTION_LENGTH)?;

        Ok(Incident {
            id,
            title,
            description,
            category: draft.category,
            severity: draft.severity,
            status: IncidentStatus::Pending,
            user_id: user_id.clone(),
            reported_at: now,
            assigned_to: None,
            admin_notes: None,
            law_enforcement_ref: None,
            forwarded_at: None,
            resolved_at: None,
            last_updated_by: None,
            last_updated_at: None,
            history: Vec::new(),
            revision: 0,
        })
    }

    /// Promote the incident's severity to `emergency`.
    ///
    /// Only the owning reporter may escalate. Calling it on an incident that is
    /// already `emergency` succeeds without change. The audit fields are left
    /// untouched: escalation is not an administrator action.
    ///
    /// Returns `true` when the severity actually changed.
    pub fn escalate(caller: &Principal, incident: &mut Incident) -> Result<bool, CyberShieldError> {
        if !incident.is_owned_by(caller.id()) {
            return Err(CyberShieldError::Authorization(format!(
                "Incident {} does not belong to {}",
                incident.id,
                caller.id()
            )));
        }
        ensure_open(incident)?;

        if incident.severity == Severity::Emergency {
            return Ok(false);
        }
        incident.severity = Severity::Emergency;
        Ok(true)
    }

    /// Apply an administrator status change.
    pub fn update_status(
        admin: &Principal,
        incident: &mut Incident,
        change: StatusChange,
        now: Timestamp,
    ) -> Result<(), CyberShieldError> {
        Self::require_admin(admin, "update_status")?;
        ensure_open(incident)?;

        let notes = optional_text("admin_notes", change.admin_notes, MAX_NOTES_LENGTH)?;
        if change
            .assigned_to
            .as_ref()
            .is_some_and(|assignee| assignee.as_str().trim().is_empty())
        {
            return Err(CyberShieldError::Validation(
                "assigned_to must not be empty".to_string(),
            ));
        }

        if change.status == IncidentStatus::ForwardedToLe {
            let reference = change.law_enforcement_ref.as_deref().unwrap_or_default();
            let reference = Self::validate_reference(reference)?;
            ensure_transition(incident.status, IncidentStatus::ForwardedToLe)?;
            if let Some(assignee) = change.assigned_to {
                incident.assigned_to = Some(assignee);
            }
            apply_forward(admin.id(), incident, reference, notes, now);
            return Ok(());
        }

        if change.law_enforcement_ref.is_some() {
            return Err(CyberShieldError::Validation(
                "law_enforcement_ref only applies when forwarding to law enforcement".to_string(),
            ));
        }
        ensure_transition(incident.status, change.status)?;

        let old_status = incident.status;
        incident.status = change.status;
        if change.status == IncidentStatus::Resolved {
            incident.resolved_at = Some(now);
        }
        if let Some(assignee) = change.assigned_to {
            incident.assigned_to = Some(assignee);
        }
        if notes.is_some() {
            incident.admin_notes.clone_from(&notes);
        }
        record_change(admin.id(), incident, old_status, notes, now);
        Ok(())
    }

    /// Forward the incident to law enforcement under `reference`.
    ///
    /// Sets `status`, `law_enforcement_ref` and `forwarded_at` in one step; on
    /// any error none of them changes.
    pub fn forward(
        admin: &Principal,
        incident: &mut Incident,
        reference: &str,
        now: Timestamp,
    ) -> Result<(), CyberShieldError> {
        Self::require_admin(admin, "forward_to_law_enforcement")?;
        ensure_open(incident)?;
        let reference = Self::validate_reference(reference)?;
        ensure_transition(incident.status, IncidentStatus::ForwardedToLe)?;

        apply_forward(admin.id(), incident, reference, None, now);
        Ok(())
    }

    /// Set the severity to any value, including a demotion.
    pub fn set_severity(
        admin: &Principal,
        incident: &mut Incident,
        severity: Severity,
        now: Timestamp,
    ) -> Result<(), CyberShieldError> {
        Self::require_admin(admin, "set_severity")?;
        ensure_open(incident)?;

        incident.severity = severity;
        touch(admin.id(), incident, now);
        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn ensure_open(incident: &Incident) -> Result<(), CyberShieldError> {
    if incident.status.is_terminal() {
        return Err(CyberShieldError::Conflict(format!(
            "Incident {} is closed",
            incident.id
        )));
    }
    Ok(())
}

fn ensure_transition(from: IncidentStatus, to: IncidentStatus) -> Result<(), CyberShieldError> {
    if Lifecycle::can_transition(from, to) {
        Ok(())
    } else {
        Err(CyberShieldError::Validation(format!(
            "Invalid status transition from {} to {}",
            from, to
        )))
    }
}

fn apply_forward(
    actor: &UserId,
    incident: &mut Incident,
    reference: String,
    notes: Option<String>,
    now: Timestamp,
) {
    let old_status = incident.status;
    incident.status = IncidentStatus::ForwardedToLe;
    incident.law_enforcement_ref = Some(reference);
    incident.forwarded_at = Some(now);
    if notes.is_some() {
        incident.admin_notes.clone_from(&notes);
    }
    record_change(actor, incident, old_status, notes, now);
}

fn record_change(
    actor: &UserId,
    incident: &mut Incident,
    old_status: IncidentStatus,
    notes: Option<String>,
    now: Timestamp,
) {
    incident.history.push(IncidentUpdate {
        updated_by: actor.clone(),
        old_status,
        new_status: incident.status,
        notes,
        at: now,
    });
    touch(actor, incident, now);
}

fn touch(actor: &UserId, incident: &mut Incident, now: Timestamp) {
    incident.last_updated_by = Some(actor.clone());
    incident.last_updated_at = Some(now);
}

fn required_text(field: &str, value: &str, max: usize) -> Result<String, CyberShieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CyberShieldError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > max {
        return Err(CyberShieldError::Validation(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            trimmed.len(),
            max
        )));
    }
    Ok(trimmed.to_string())
}

fn optional_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, CyberShieldError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => required_text(field, &v, max).map(Some),
    }
}

// =============================================================================
// TESTS
// =============================================================================
