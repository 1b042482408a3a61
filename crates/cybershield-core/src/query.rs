//! # Query Module
//!
//! Structured incident filters for the persistence gateway.
//!
//! A filter is a conjunction: every populated field must match. Empty lists
//! and `None` fields match everything.

use crate::{Category, Incident, IncidentStatus, Severity, UserId};

/// Filter over the incident collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    /// Any of these statuses.
    pub status: Vec<IncidentStatus>,
    /// Any of these severities.
    pub severity: Vec<Severity>,
    /// Any of these categories.
    pub category: Vec<Category>,
    pub assigned_to: Option<UserId>,
    /// Owning reporter.
    pub reporter: Option<UserId>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl IncidentFilter {
    /// Filter that matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Incidents reported by one user.
    #[must_use]
    pub fn by_reporter(user: UserId) -> Self {
        Self {
            reporter: Some(user),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status.push(status);
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity.push(severity);
        self
    }

    #[must_use]
    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    /// Whether the incident satisfies every populated criterion.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        if !self.status.is_empty() && !self.status.contains(&incident.status) {
            return false;
        }
        if !self.severity.is_empty() && !self.severity.contains(&incident.severity) {
            return false;
        }
        if !self.category.is_empty() && !self.category.contains(&incident.category) {
            return false;
        }
        if self
            .assigned_to
            .as_ref()
            .is_some_and(|assignee| incident.assigned_to.as_ref() != Some(assignee))
        {
            return false;
        }
        if self
            .reporter
            .as_ref()
            .is_some_and(|reporter| &incident.user_id != reporter)
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                incident.title.to_lowercase().contains(&needle)
                    || incident.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Apply the filter to an iterator, newest report first, honouring `limit`.
    pub fn apply<'a>(&self, incidents: impl IntoIterator<Item = &'a Incident>) -> Vec<Incident> {
        let mut matched: Vec<Incident> = incidents
            .into_iter()
            .filter(|i| self.matches(i))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Lifecycle, NewIncident};
    use crate::{IncidentId, Principal};
    use chrono::{Duration, TimeZone, Utc};

    fn incident(reporter: &str, title: &str, category: &str, hours: i64) -> Incident {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date")
            + Duration::hours(hours);
        let draft = NewIncident::from_labels(title, "details", category, "medium").expect("draft");
        Lifecycle::create(&Principal::reporter(reporter), draft, IncidentId::generate(), now)
            .expect("create")
    }

    #[test]
    fn empty_filter_matches_all() {
        let i = incident("U1", "Fake invoice", "phishing", 0);
        assert!(IncidentFilter::all().matches(&i));
    }

    #[test]
    fn reporter_filter() {
        let i = incident("U1", "Fake invoice", "phishing", 0);
        assert!(IncidentFilter::by_reporter(UserId::new("U1")).matches(&i));
        assert!(!IncidentFilter::by_reporter(UserId::new("U2")).matches(&i));
    }

    #[test]
    fn search_is_case_insensitive() {
        let i = incident("U1", "Fake Invoice", "phishing", 0);
        assert!(IncidentFilter::all().with_search("invoice").matches(&i));
        assert!(!IncidentFilter::all().with_search("ransom").matches(&i));
    }

    #[test]
    fn apply_sorts_newest_first_and_limits() {
        let a = incident("U1", "a", "malware", 1);
        let b = incident("U1", "b", "malware", 3);
        let c = incident("U1", "c", "phishing", 2);
        let filter = IncidentFilter {
            category: vec![Category::Malware],
            limit: Some(5),
            ..IncidentFilter::default()
        };
        let out = filter.apply([&a, &b, &c]);
        let titles: Vec<_> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }
}
