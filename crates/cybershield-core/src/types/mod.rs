//! # Core Type Definitions
//!
//! This module contains all core types for the CyberShield incident lifecycle:
//! - Identifiers (`IncidentId`, `UserId`)
//! - Closed enumerations (`Severity`, `IncidentStatus`, `Category`)
//! - Records (`Incident`, `IncidentUpdate`, `User`)
//! - Actors (`Role`, `Principal`)
//! - Error types (`CyberShieldError`)
//!
//! ## Boundary Parsing
//!
//! Every enumeration implements `FromStr` over its wire name. Unknown values are
//! rejected with `CyberShieldError::Validation`; there is no catch-all variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Wall-clock timestamp used for every record field.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of an incident.
///
/// Generated as a random UUID at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub Uuid);

impl IncidentId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IncidentId {
    type Err = CyberShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CyberShieldError::Validation(format!("Invalid incident id: {}", s)))
    }
}

/// Identifier of a user (reporter or administrator).
///
/// Issued by the identity provider; the core treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id from any string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Implements `as_str`, `Display` and `FromStr` over the snake_case wire names.
macro_rules! wire_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The wire name of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CyberShieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(CyberShieldError::Validation(format!(
                        "Unknown {}: '{}'",
                        $label, other
                    ))),
                }
            }
        }
    };
}

/// Severity of an incident.
///
/// Declaration order is the escalation order: `Low < Medium < High < Emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Emergency,
}

wire_enum!(Severity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Emergency => "emergency",
});

/// Lifecycle status of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Initial state, set at creation.
    Pending,
    Reviewing,
    Resolved,
    /// Handed to law enforcement; carries a case reference.
    ForwardedToLe,
    /// Terminal.
    Closed,
}

wire_enum!(IncidentStatus, "status", {
    Pending => "pending",
    Reviewing => "reviewing",
    Resolved => "resolved",
    ForwardedToLe => "forwarded_to_le",
    Closed => "closed",
});

impl IncidentStatus {
    /// Whether no further mutation is accepted in this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Category of cybercrime reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Phishing,
    Malware,
    Ransomware,
    DataBreach,
    IdentityTheft,
    FinancialFraud,
    SocialEngineering,
    Other,
}

wire_enum!(Category, "category", {
    Phishing => "phishing",
    Malware => "malware",
    Ransomware => "ransomware",
    DataBreach => "data_breach",
    IdentityTheft => "identity_theft",
    FinancialFraud => "financial_fraud",
    SocialEngineering => "social_engineering",
    Other => "other",
});

// =============================================================================
// INCIDENT
// =============================================================================

/// One administrator status change, kept in the incident's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub updated_by: UserId,
    pub old_status: IncidentStatus,
    pub new_status: IncidentStatus,
    pub notes: Option<String>,
    pub at: Timestamp,
}

/// A reported cybercrime event tracked through the status lifecycle.
///
/// `title`, `description`, `category`, `reported_at` and `user_id` never change
/// after creation. Everything else is owned by the lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub status: IncidentStatus,
    /// Owning reporter.
    pub user_id: UserId,
    pub reported_at: Timestamp,

    pub assigned_to: Option<UserId>,
    pub admin_notes: Option<String>,
    /// Set together with `forwarded_at`, never unset.
    pub law_enforcement_ref: Option<String>,
    pub forwarded_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,

    /// Last administrator to mutate the incident.
    pub last_updated_by: Option<UserId>,
    pub last_updated_at: Option<Timestamp>,

    /// Administrator status changes, oldest first.
    pub history: Vec<IncidentUpdate>,
    /// Optimistic concurrency token, bumped by the store on every write.
    pub revision: u64,
}

impl Incident {
    /// Whether the incident belongs to the given reporter.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }

    /// Whether the incident has been handed to law enforcement.
    #[must_use]
    pub fn is_forwarded(&self) -> bool {
        self.status == IncidentStatus::ForwardedToLe || self.law_enforcement_ref.is_some()
    }
}

// =============================================================================
// USERS & PRINCIPALS
// =============================================================================

/// Role of a user, fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reporter,
    Administrator {
        badge_number: String,
        department: String,
    },
}

impl Role {
    /// Short role label (`user` or `admin`).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reporter => "user",
            Self::Administrator { .. } => "admin",
        }
    }
}

/// An authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: Timestamp,
}

impl User {
    /// The principal this user acts as.
    #[must_use]
    pub fn principal(&self) -> Principal {
        match &self.role {
            Role::Reporter => Principal::Reporter(self.id.clone()),
            Role::Administrator {
                badge_number,
                department,
            } => Principal::Administrator {
                id: self.id.clone(),
                badge_number: badge_number.clone(),
                department: department.clone(),
            },
        }
    }
}

/// The actor invoking a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    Reporter(UserId),
    Administrator {
        id: UserId,
        badge_number: String,
        department: String,
    },
}

impl Principal {
    /// Build an administrator principal.
    #[must_use]
    pub fn admin(
        id: impl Into<String>,
        badge_number: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self::Administrator {
            id: UserId::new(id),
            badge_number: badge_number.into(),
            department: department.into(),
        }
    }

    /// Build a reporter principal.
    #[must_use]
    pub fn reporter(id: impl Into<String>) -> Self {
        Self::Reporter(UserId::new(id))
    }

    /// The user id behind this principal.
    #[must_use]
    pub fn id(&self) -> &UserId {
        match self {
            Self::Reporter(id) | Self::Administrator { id, .. } => id,
        }
    }

    /// Whether this principal may perform administrator actions.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Administrator { .. })
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the CyberShield core.
///
/// Every fallible operation returns `Result<T, CyberShieldError>`. Nothing in the
/// core panics or retries; callers decide how to surface the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CyberShieldError {
    /// Malformed or missing input, or an illegal state transition.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller's role or identity does not permit the mutation.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// The referenced incident or user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record is closed, already exists, or changed underneath the caller.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The persistence gateway failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CyberShieldError {
    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authorization(_) => "AUTHORIZATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) | Self::Serialization(_) => "INTERNAL_ERROR",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
