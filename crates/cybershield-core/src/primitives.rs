//! # Primitives
//!
//! Hardcoded limits and format constants for the CyberShield core.
//!
//! These are compiled into the binary and are immutable at runtime. The
//! input limits are checked by the lifecycle rules before any record is built.

/// Magic bytes for the stored record format header.
///
/// - Record = Magic Bytes ("CYSH") + Version (u8) before the postcard payload.
pub const MAGIC_BYTES: &[u8; 4] = b"CYSH";

/// Current record format version.
///
/// Increment this when making breaking changes to the stored record layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of an incident title, in bytes.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of an incident description, in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length of administrator notes, in bytes.
pub const MAX_NOTES_LENGTH: usize = 4_000;

/// Maximum length of a law-enforcement case reference, in bytes.
pub const MAX_REFERENCE_LENGTH: usize = 128;

/// Maximum length of user names, emails and badge numbers, in bytes.
pub const MAX_IDENTITY_FIELD_LENGTH: usize = 256;

// =============================================================================
// DASHBOARD
// =============================================================================

/// Number of incidents in the dashboard "recent" list.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Upper bound for a caller-supplied recent limit.
pub const MAX_RECENT_LIMIT: usize = 100;

/// Upper bound for the `limit` of an incident listing.
pub const MAX_LIST_LIMIT: usize = 1_000;
