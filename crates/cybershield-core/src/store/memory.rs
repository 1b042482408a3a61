//! # In-Memory Store
//!
//! Volatile `IncidentStore` backed by ordered maps. Used by tests and by the
//! `memory` backend of the binary.

use super::IncidentStore;
use crate::query::IncidentFilter;
use crate::{CyberShieldError, Incident, IncidentId, User, UserId};
use std::collections::BTreeMap;

/// Volatile incident and user collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    incidents: BTreeMap<IncidentId, Incident>,
    users: BTreeMap<UserId, User>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IncidentStore for MemoryStore {
    fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, CyberShieldError> {
        Ok(self.incidents.get(&id).cloned())
    }

    fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CyberShieldError> {
        Ok(filter.apply(self.incidents.values()))
    }

    fn create_incident(&mut self, incident: &Incident) -> Result<(), CyberShieldError> {
        if self.incidents.contains_key(&incident.id) {
            return Err(CyberShieldError::Conflict(format!(
                "Incident {} already exists",
                incident.id
            )));
        }
        self.incidents.insert(incident.id, incident.clone());
        Ok(())
    }

    fn update_incident(
        &mut self,
        incident: &Incident,
        expected_revision: u64,
    ) -> Result<Incident, CyberShieldError> {
        let stored = self
            .incidents
            .get_mut(&incident.id)
            .ok_or_else(|| CyberShieldError::NotFound(format!("Incident {}", incident.id)))?;
        super::check_revision(incident.id, stored.revision, expected_revision)?;

        let mut next = incident.clone();
        next.revision = expected_revision.saturating_add(1);
        *stored = next.clone();
        Ok(next)
    }

    fn incident_count(&self) -> Result<usize, CyberShieldError> {
        Ok(self.incidents.len())
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>, CyberShieldError> {
        Ok(self.users.get(id).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, CyberShieldError> {
        Ok(self.users.values().cloned().collect())
    }

    fn create_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        if self.users.contains_key(&user.id) {
            return Err(CyberShieldError::Conflict(format!(
                "User {} already exists",
                user.id
            )));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn update_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        let stored = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| CyberShieldError::NotFound(format!("User {}", user.id)))?;
        *stored = user.clone();
        Ok(())
    }
}
