//! # cybershield-core
//!
//! The incident lifecycle engine for CyberShield - THE LOGIC.
//!
//! This crate owns the rules for cybercrime incident reports: who may move an
//! incident between statuses, how it is escalated and forwarded to law
//! enforcement, and how it is stored.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - No logging: errors are returned, the app layer decides how to report them
//! - Ordered collections only (`BTreeMap`), integer arithmetic only
//! - The clock is read in `service` and nowhere else

// =============================================================================
// MODULES
// =============================================================================

pub mod dashboard;
pub mod formats;
pub mod identity;
pub mod lifecycle;
pub mod primitives;
pub mod query;
pub mod service;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Category, CyberShieldError, Incident, IncidentId, IncidentStatus, IncidentUpdate, Principal,
    Role, Severity, Timestamp, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Lifecycle Engine
// =============================================================================

pub use dashboard::{
    CategoryCounts, DashboardStats, SeverityCounts, StatusCounts, law_enforcement_queue,
};
pub use identity::{IdentityProvider, ProfileUpdate, UserRegistration};
pub use lifecycle::{Lifecycle, NewIncident, StatusChange};
pub use query::IncidentFilter;
pub use service::IncidentService;
pub use store::{IncidentStore, MemoryStore, RedbStore, StorageBackend};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{RecordHeader, decode_record, encode_record};
