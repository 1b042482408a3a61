//! # Dashboard Aggregation
//!
//! Pure projections over an incident slice for the administrator dashboard and
//! the law-enforcement console. Nothing here touches storage or the clock:
//! callers pass the incidents and `now`.

use crate::primitives::DEFAULT_RECENT_LIMIT;
use crate::{Category, Incident, IncidentStatus, Severity, Timestamp};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Incident counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub reviewing: usize,
    pub resolved: usize,
    pub forwarded_to_le: usize,
    pub closed: usize,
}

impl StatusCounts {
    fn add(&mut self, status: IncidentStatus) {
        let slot = match status {
            IncidentStatus::Pending => &mut self.pending,
            IncidentStatus::Reviewing => &mut self.reviewing,
            IncidentStatus::Resolved => &mut self.resolved,
            IncidentStatus::ForwardedToLe => &mut self.forwarded_to_le,
            IncidentStatus::Closed => &mut self.closed,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Incident counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub emergency: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::Low => &mut self.low,
            Severity::Medium => &mut self.medium,
            Severity::High => &mut self.high,
            Severity::Emergency => &mut self.emergency,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Incident counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub phishing: usize,
    pub malware: usize,
    pub ransomware: usize,
    pub data_breach: usize,
    pub identity_theft: usize,
    pub financial_fraud: usize,
    pub social_engineering: usize,
    pub other: usize,
}

impl CategoryCounts {
    fn add(&mut self, category: Category) {
        let slot = match category {
            Category::Phishing => &mut self.phishing,
            Category::Malware => &mut self.malware,
            Category::Ransomware => &mut self.ransomware,
            Category::DataBreach => &mut self.data_breach,
            Category::IdentityTheft => &mut self.identity_theft,
            Category::FinancialFraud => &mut self.financial_fraud,
            Category::SocialEngineering => &mut self.social_engineering,
            Category::Other => &mut self.other,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Aggregated dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub emergency: usize,
    pub by_status: StatusCounts,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
    /// Reported on the same UTC calendar day as `now`.
    pub incidents_today: usize,
    /// Reported within the last 7 days.
    pub incidents_this_week: usize,
    /// Reported within the last 30 days.
    pub incidents_this_month: usize,
    /// Mean minutes from report to resolution, `None` when nothing is resolved.
    pub average_resolution_minutes: Option<i64>,
    /// Most recently reported incidents, newest first.
    pub recent: Vec<Incident>,
}

impl DashboardStats {
    /// Aggregate with the default recent-list size.
    #[must_use]
    pub fn compute(incidents: &[Incident], now: Timestamp) -> Self {
        Self::compute_with_limit(incidents, now, DEFAULT_RECENT_LIMIT)
    }

    #[must_use]
    pub fn compute_with_limit(incidents: &[Incident], now: Timestamp, recent_limit: usize) -> Self {
        let mut by_status = StatusCounts::default();
        let mut by_severity = SeverityCounts::default();
        let mut by_category = CategoryCounts::default();

        let today = now.date_naive();
        let week_start = now - Duration::days(7);
        let month_start = now - Duration::days(30);
        let mut incidents_today = 0usize;
        let mut incidents_this_week = 0usize;
        let mut incidents_this_month = 0usize;

        let mut resolution_total = 0i64;
        let mut resolved = 0i64;

        for incident in incidents {
            by_status.add(incident.status);
            by_severity.add(incident.severity);
            by_category.add(incident.category);

            if incident.reported_at.date_naive() == today {
                incidents_today += 1;
            }
            if incident.reported_at >= week_start {
                incidents_this_week += 1;
            }
            if incident.reported_at >= month_start {
                incidents_this_month += 1;
            }
            if let Some(resolved_at) = incident.resolved_at {
                let minutes = (resolved_at - incident.reported_at).num_minutes().max(0);
                resolution_total = resolution_total.saturating_add(minutes);
                resolved += 1;
            }
        }

        let average_resolution_minutes = resolution_total.checked_div(resolved);

        let mut recent: Vec<Incident> = incidents.to_vec();
        recent.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(a.id.cmp(&b.id)));
        recent.truncate(recent_limit);

        Self {
            total: incidents.len(),
            emergency: by_severity.emergency,
            by_status,
            by_severity,
            by_category,
            incidents_today,
            incidents_this_week,
            incidents_this_month,
            average_resolution_minutes,
            recent,
        }
    }
}

/// Incidents handed to law enforcement, most severe first, then most recently forwarded.
#[must_use]
pub fn law_enforcement_queue(incidents: &[Incident]) -> Vec<Incident> {
    let mut queue: Vec<Incident> = incidents
        .iter()
        .filter(|i| i.is_forwarded())
        .cloned()
        .collect();
    queue.sort_by_key(|i| (Reverse(i.severity), Reverse(i.forwarded_at), i.id));
    queue
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Lifecycle, NewIncident, StatusChange};
    use crate::{IncidentId, Principal};
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("date")
    }

    fn reported(days_ago: i64, category: &str, severity: &str) -> Incident {
        let draft = NewIncident::from_labels("title", "description", category, severity)
            .expect("draft");
        Lifecycle::create(
            &Principal::reporter("U1"),
            draft,
            IncidentId::generate(),
            now() - Duration::days(days_ago),
        )
        .expect("create")
    }

    fn admin() -> Principal {
        Principal::admin("A1", "B-1", "Cyber")
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = DashboardStats::compute(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.emergency, 0);
        assert_eq!(stats.by_status, StatusCounts::default());
        assert_eq!(stats.average_resolution_minutes, None);
        assert!(stats.recent.is_empty());
        assert!(law_enforcement_queue(&[]).is_empty());
    }

    #[test]
    fn counts_and_windows() {
        let incidents = vec![
            reported(0, "phishing", "low"),
            reported(3, "malware", "emergency"),
            reported(20, "malware", "high"),
            reported(90, "other", "emergency"),
        ];
        let stats = DashboardStats::compute(&incidents, now());

        assert_eq!(stats.total, 4);
        assert_eq!(stats.emergency, 2);
        assert_eq!(stats.by_status.pending, 4);
        assert_eq!(stats.by_category.malware, 2);
        assert_eq!(stats.by_category.phishing, 1);
        assert_eq!(stats.by_severity.high, 1);
        assert_eq!(stats.incidents_today, 1);
        assert_eq!(stats.incidents_this_week, 2);
        assert_eq!(stats.incidents_this_month, 3);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let incidents: Vec<_> = (0..8).map(|d| reported(d, "phishing", "low")).collect();
        let stats = DashboardStats::compute(&incidents, now());
        assert_eq!(stats.recent.len(), 5);
        assert_eq!(stats.recent[0].reported_at, now());
        assert!(stats.recent.windows(2).all(|w| w[0].reported_at >= w[1].reported_at));

        let small = DashboardStats::compute_with_limit(&incidents, now(), 2);
        assert_eq!(small.recent.len(), 2);
    }

    #[test]
    fn average_resolution_uses_resolved_only() {
        let mut a = reported(1, "phishing", "low");
        let mut b = reported(1, "phishing", "low");
        let c = reported(1, "phishing", "low");
        let reported_at = a.reported_at;
        Lifecycle::update_status(
            &admin(),
            &mut a,
            StatusChange::to(IncidentStatus::Resolved),
            reported_at + Duration::minutes(30),
        )
        .expect("resolve a");
        Lifecycle::update_status(
            &admin(),
            &mut b,
            StatusChange::to(IncidentStatus::Resolved),
            reported_at + Duration::minutes(90),
        )
        .expect("resolve b");

        let stats = DashboardStats::compute(&[a, b, c], now());
        assert_eq!(stats.average_resolution_minutes, Some(60));
        assert_eq!(stats.by_status.resolved, 2);
    }

    #[test]
    fn queue_orders_by_severity_then_forwarded_at() {
        let mut low = reported(5, "phishing", "low");
        let mut urgent_old = reported(5, "ransomware", "emergency");
        let mut urgent_new = reported(5, "ransomware", "emergency");
        let untouched = reported(5, "other", "emergency");

        Lifecycle::forward(&admin(), &mut low, "LE-1", now()).expect("forward");
        Lifecycle::forward(&admin(), &mut urgent_old, "LE-2", now() - Duration::hours(2))
            .expect("forward");
        Lifecycle::forward(&admin(), &mut urgent_new, "LE-3", now() - Duration::hours(1))
            .expect("forward");

        let queue = law_enforcement_queue(&[low, untouched, urgent_old, urgent_new]);
        let refs: Vec<_> = queue
            .iter()
            .map(|i| i.law_enforcement_ref.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(refs, vec!["LE-3", "LE-2", "LE-1"]);
    }
}
