//! # Incident Service
//!
//! The unit-of-work layer: every operation reads the current record, applies a
//! `Lifecycle` rule, and writes the result back with the revision it read.
//!
//! ## Check Order
//!
//! Administrator operations check, in order: role, existence, closed state,
//! then the transition itself. A reporter calling an administrator operation
//! therefore always gets `Authorization`, whatever the incident's state.

use crate::dashboard::{self, DashboardStats};
use crate::identity::{IdentityProvider, ProfileUpdate, UserRegistration};
use crate::lifecycle::{Lifecycle, NewIncident, StatusChange};
use crate::primitives::{DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT};
use crate::query::IncidentFilter;
use crate::store::{IncidentStore, MemoryStore, RedbStore, StorageBackend};
use crate::{CyberShieldError, Incident, IncidentId, Principal, Severity, Timestamp, User, UserId};
use chrono::Utc;
use std::path::Path;

/// Incident lifecycle operations over an injected store.
#[derive(Debug)]
pub struct IncidentService {
    store: StorageBackend,
    recent_limit: usize,
}

impl Default for IncidentService {
    fn default() -> Self {
        Self::with_store(StorageBackend::default())
    }
}

impl IncidentService {
    /// Create a service over a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(store: StorageBackend) -> Self {
        Self {
            store,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_memory(store: MemoryStore) -> Self {
        Self::with_store(StorageBackend::InMemory(store))
    }

    /// Open or create a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, CyberShieldError> {
        let redb = RedbStore::open(path)?;
        Ok(Self::with_store(StorageBackend::Persistent(redb)))
    }

    /// Size of the dashboard's recent list, clamped to `1..=MAX_RECENT_LIMIT`.
    #[must_use]
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit.clamp(1, MAX_RECENT_LIMIT);
        self
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store.is_persistent()
    }

    pub fn incident_count(&self) -> Result<usize, CyberShieldError> {
        self.store.incident_count()
    }

    /// Compact the underlying database. Returns `false` when there is no file.
    pub fn compact(&mut self) -> Result<bool, CyberShieldError> {
        self.store.compact()
    }

    fn now() -> Timestamp {
        Utc::now()
    }

    fn load(&self, id: IncidentId) -> Result<Incident, CyberShieldError> {
        self.store
            .get_incident(id)?
            .ok_or_else(|| CyberShieldError::NotFound(format!("Incident {}", id)))
    }

    /// Read, mutate and write back one incident under its current revision.
    fn modify<F>(&mut self, id: IncidentId, rule: F) -> Result<Incident, CyberShieldError>
    where
        F: FnOnce(&mut Incident) -> Result<bool, CyberShieldError>,
    {
        let mut incident = self.load(id)?;
        let expected = incident.revision;
        if rule(&mut incident)? {
            self.store.update_incident(&incident, expected)
        } else {
            Ok(incident)
        }
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Register a reporter or administrator.
    pub fn register_user(&mut self, registration: UserRegistration) -> Result<User, CyberShieldError> {
        let user = registration.into_user(Self::now())?;
        self.store.create_user(&user)?;
        Ok(user)
    }

    pub fn get_user(&self, id: &UserId) -> Result<User, CyberShieldError> {
        self.store
            .get_user(id)?
            .ok_or_else(|| CyberShieldError::NotFound(format!("User {}", id)))
    }

    pub fn list_users(&self) -> Result<Vec<User>, CyberShieldError> {
        self.store.list_users()
    }

    /// Change a user's name or email.
    ///
    /// Users edit their own profile; administrators may edit anyone's.
    pub fn update_profile(
        &mut self,
        caller: &Principal,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, CyberShieldError> {
        if !caller.is_admin() && caller.id() != id {
            return Err(CyberShieldError::Authorization(format!(
                "{} may not edit the profile of {}",
                caller.id(),
                id
            )));
        }
        let mut user = self.get_user(id)?;
        if update.apply(&mut user)? {
            self.store.update_user(&user)?;
        }
        Ok(user)
    }

    /// Resolve an authenticated user id to its principal.
    pub fn principal(&self, id: &UserId) -> Result<Principal, CyberShieldError> {
        self.store.resolve(id)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Report a new incident. The caller must be a reporter.
    pub fn create_incident(
        &mut self,
        reporter: &Principal,
        draft: NewIncident,
    ) -> Result<Incident, CyberShieldError> {
        let incident = Lifecycle::create(reporter, draft, IncidentId::generate(), Self::now())?;
        self.store.create_incident(&incident)?;
        Ok(incident)
    }

    /// Raise the severity of the caller's own incident to `emergency`.
    pub fn escalate_incident(
        &mut self,
        reporter: &Principal,
        id: IncidentId,
    ) -> Result<Incident, CyberShieldError> {
        self.modify(id, |incident| Lifecycle::escalate(reporter, incident))
    }

    pub fn update_status(
        &mut self,
        admin: &Principal,
        id: IncidentId,
        change: StatusChange,
    ) -> Result<Incident, CyberShieldError> {
        Lifecycle::require_admin(admin, "update_status")?;
        let now = Self::now();
        self.modify(id, |incident| {
            Lifecycle::update_status(admin, incident, change, now).map(|()| true)
        })
    }

    pub fn forward_to_law_enforcement(
        &mut self,
        admin: &Principal,
        id: IncidentId,
        reference: &str,
    ) -> Result<Incident, CyberShieldError> {
        Lifecycle::require_admin(admin, "forward_to_law_enforcement")?;
        let now = Self::now();
        self.modify(id, |incident| {
            Lifecycle::forward(admin, incident, reference, now).map(|()| true)
        })
    }

    pub fn set_severity(
        &mut self,
        admin: &Principal,
        id: IncidentId,
        severity: Severity,
    ) -> Result<Incident, CyberShieldError> {
        Lifecycle::require_admin(admin, "set_severity")?;
        let now = Self::now();
        self.modify(id, |incident| {
            Lifecycle::set_severity(admin, incident, severity, now).map(|()| true)
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Read-only view of one incident.
    pub fn view_incident_detail(&self, id: IncidentId) -> Result<Incident, CyberShieldError> {
        self.load(id)
    }

    /// Filtered listing for administrators.
    pub fn list_incidents(
        &self,
        admin: &Principal,
        filter: &IncidentFilter,
    ) -> Result<Vec<Incident>, CyberShieldError> {
        Lifecycle::require_admin(admin, "list_incidents")?;
        self.store.list_incidents(filter)
    }

    /// Incidents reported by one user, newest first.
    pub fn list_reporter_incidents(&self, user: &UserId) -> Result<Vec<Incident>, CyberShieldError> {
        self.store
            .list_incidents(&IncidentFilter::by_reporter(user.clone()))
    }

    pub fn dashboard(&self, admin: &Principal) -> Result<DashboardStats, CyberShieldError> {
        Lifecycle::require_admin(admin, "dashboard")?;
        let incidents = self.store.list_incidents(&IncidentFilter::all())?;
        Ok(DashboardStats::compute_with_limit(
            &incidents,
            Self::now(),
            self.recent_limit,
        ))
    }

    pub fn law_enforcement_queue(&self, admin: &Principal) -> Result<Vec<Incident>, CyberShieldError> {
        Lifecycle::require_admin(admin, "law_enforcement_queue")?;
        let incidents = self.store.list_incidents(&IncidentFilter::all())?;
        Ok(dashboard::law_enforcement_queue(&incidents))
    }
}

// =============================================================================
// TESTS
// =============================================================================
