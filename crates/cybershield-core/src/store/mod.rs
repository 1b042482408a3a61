//! # Store Module
//!
//! The persistence gateway for incidents and users.
//!
//! ## Storage Backends
//!
//! - `InMemory`: ordered maps, volatile
//! - `Persistent`: redb database, ACID and disk-backed
//!
//! Every incident carries a `revision`. `update_incident` takes the revision
//! the caller read and fails with `Conflict` if the stored record has moved
//! on since, so two administrators editing the same incident cannot silently
//! overwrite each other: the first write wins.

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::query::IncidentFilter;
use crate::{CyberShieldError, Incident, IncidentId, User, UserId};

/// Persistence operations used by the incident service.
pub trait IncidentStore {
    /// Fetch one incident.
    fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, CyberShieldError>;

    /// All incidents matching the filter, newest report first.
    fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CyberShieldError>;

    /// Insert a new incident. Fails with `Conflict` if the id is taken.
    fn create_incident(&mut self, incident: &Incident) -> Result<(), CyberShieldError>;

    /// Replace a stored incident if its revision still equals `expected_revision`.
    ///
    /// Returns the stored record with its bumped revision.
    fn update_incident(
        &mut self,
        incident: &Incident,
        expected_revision: u64,
    ) -> Result<Incident, CyberShieldError>;

    fn incident_count(&self) -> Result<usize, CyberShieldError>;

    fn get_user(&self, id: &UserId) -> Result<Option<User>, CyberShieldError>;

    fn list_users(&self) -> Result<Vec<User>, CyberShieldError>;

    /// Insert a new user. Fails with `Conflict` if the id is taken.
    fn create_user(&mut self, user: &User) -> Result<(), CyberShieldError>;

    /// Replace an existing user. Fails with `NotFound` if the id is unknown.
    fn update_user(&mut self, user: &User) -> Result<(), CyberShieldError>;
}

/// Compare a stored revision with the one a writer read.
pub(crate) fn check_revision(
    id: IncidentId,
    stored: u64,
    expected: u64,
) -> Result<(), CyberShieldError> {
    if stored == expected {
        Ok(())
    } else {
        Err(CyberShieldError::Conflict(format!(
            "Incident {id} was modified concurrently (revision {stored}, expected {expected})"
        )))
    }
}

/// Storage backend for the incident service.
#[derive(Debug)]
pub enum StorageBackend {
    /// Ordered maps (fast, volatile).
    InMemory(MemoryStore),
    /// redb database (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    /// Compact the database file. Returns `false` for the in-memory backend.
    pub fn compact(&mut self) -> Result<bool, CyberShieldError> {
        match self {
            Self::InMemory(_) => Ok(false),
            Self::Persistent(s) => s.compact().map(|()| true),
        }
    }
}

impl IncidentStore for StorageBackend {
    fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.get_incident(id),
            Self::Persistent(s) => s.get_incident(id),
        }
    }

    fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.list_incidents(filter),
            Self::Persistent(s) => s.list_incidents(filter),
        }
    }

    fn create_incident(&mut self, incident: &Incident) -> Result<(), CyberShieldError> {
        match self {
            Self::InMemory(s) => s.create_incident(incident),
            Self::Persistent(s) => s.create_incident(incident),
        }
    }

    fn update_incident(
        &mut self,
        incident: &Incident,
        expected_revision: u64,
    ) -> Result<Incident, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.update_incident(incident, expected_revision),
            Self::Persistent(s) => s.update_incident(incident, expected_revision),
        }
    }

    fn incident_count(&self) -> Result<usize, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.incident_count(),
            Self::Persistent(s) => s.incident_count(),
        }
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.get_user(id),
            Self::Persistent(s) => s.get_user(id),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, CyberShieldError> {
        match self {
            Self::InMemory(s) => s.list_users(),
            Self::Persistent(s) => s.list_users(),
        }
    }

    fn create_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        match self {
            Self::InMemory(s) => s.create_user(user),
            Self::Persistent(s) => s.create_user(user),
        }
    }

    fn update_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        match self {
            Self::InMemory(s) => s.update_user(user),
            Self::Persistent(s) => s.update_user(user),
        }
    }
}
