//! # redb-backed Store
//!
//! A disk-backed `IncidentStore` using the redb embedded database.
//!
//! Each record is stored as header + postcard bytes (see `formats::record`).
//! Every write runs in its own ACID transaction, and the revision check of
//! `update_incident` happens inside that transaction, so a stale writer can
//! never overwrite a newer record.

use super::IncidentStore;
use crate::formats::{decode_record, encode_record};
use crate::query::IncidentFilter;
use crate::{CyberShieldError, Incident, IncidentId, User, UserId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for incidents: IncidentId (u128) -> encoded Incident bytes
const INCIDENTS: TableDefinition<u128, &[u8]> = TableDefinition::new("incidents");

/// Table for users: UserId -> encoded User bytes
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

fn storage_err(e: impl std::fmt::Display) -> CyberShieldError {
    CyberShieldError::Storage(e.to_string())
}

/// A disk-backed incident store.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CyberShieldError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(INCIDENTS).map_err(storage_err)?;
            let _ = write_txn.open_table(USERS).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), CyberShieldError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }
}

impl IncidentStore for RedbStore {
    fn get_incident(&self, id: IncidentId) -> Result<Option<Incident>, CyberShieldError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(INCIDENTS).map_err(storage_err)?;
        let guard = table.get(id.0.as_u128()).map_err(storage_err)?;
        guard.map(|bytes| decode_record(bytes.value())).transpose()
    }

    fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, CyberShieldError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(INCIDENTS).map_err(storage_err)?;

        let mut incidents = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, bytes) = entry.map_err(storage_err)?;
            let incident: Incident = decode_record(bytes.value())?;
            if filter.matches(&incident) {
                incidents.push(incident);
            }
        }
        Ok(filter.apply(&incidents))
    }

    fn create_incident(&mut self, incident: &Incident) -> Result<(), CyberShieldError> {
        let bytes = encode_record(incident)?;
        let key = incident.id.0.as_u128();

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(INCIDENTS).map_err(storage_err)?;
            let exists = table.get(key).map_err(storage_err)?.is_some();
            if exists {
                return Err(CyberShieldError::Conflict(format!(
                    "Incident {} already exists",
                    incident.id
                )));
            }
            table.insert(key, bytes.as_slice()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn update_incident(
        &mut self,
        incident: &Incident,
        expected_revision: u64,
    ) -> Result<Incident, CyberShieldError> {
        let key = incident.id.0.as_u128();
        let mut next = incident.clone();
        next.revision = expected_revision.saturating_add(1);
        let bytes = encode_record(&next)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(INCIDENTS).map_err(storage_err)?;
            let current: Incident = match table.get(key).map_err(storage_err)? {
                Some(guard) => decode_record(guard.value())?,
                None => {
                    return Err(CyberShieldError::NotFound(format!(
                        "Incident {}",
                        incident.id
                    )));
                }
            };
            super::check_revision(incident.id, current.revision, expected_revision)?;
            table.insert(key, bytes.as_slice()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(next)
    }

    fn incident_count(&self) -> Result<usize, CyberShieldError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(INCIDENTS).map_err(storage_err)?;
        Ok(table.len().map_err(storage_err)? as usize)
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>, CyberShieldError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(USERS).map_err(storage_err)?;
        let guard = table.get(id.as_str()).map_err(storage_err)?;
        guard.map(|bytes| decode_record(bytes.value())).transpose()
    }

    fn list_users(&self) -> Result<Vec<User>, CyberShieldError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(USERS).map_err(storage_err)?;

        let mut users = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, bytes) = entry.map_err(storage_err)?;
            users.push(decode_record(bytes.value())?);
        }
        Ok(users)
    }

    fn create_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        let bytes = encode_record(user)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(USERS).map_err(storage_err)?;
            let exists = table.get(user.id.as_str()).map_err(storage_err)?.is_some();
            if exists {
                return Err(CyberShieldError::Conflict(format!(
                    "User {} already exists",
                    user.id
                )));
            }
            table.insert(user.id.as_str(), bytes.as_slice()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn update_user(&mut self, user: &User) -> Result<(), CyberShieldError> {
        let bytes = encode_record(user)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(USERS).map_err(storage_err)?;
            let exists = table.get(user.id.as_str()).map_err(storage_err)?.is_some();
            if !exists {
                return Err(CyberShieldError::NotFound(format!("User {}", user.id)));
            }
            table.insert(user.id.as_str(), bytes.as_slice()).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }
}

// =============================================================================
// TESTS
// =============================================================================
