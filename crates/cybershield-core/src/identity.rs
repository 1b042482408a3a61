//! # Identity
//!
//! User registration rules and the principal lookup used by every caller-facing
//! surface.

use crate::primitives::MAX_IDENTITY_FIELD_LENGTH;
use crate::store::IncidentStore;
use crate::{CyberShieldError, Principal, Role, Timestamp, User, UserId};

/// Resolves an authenticated user id to the principal it acts as.
pub trait IdentityProvider {
    /// `NotFound` when the id is unknown.
    fn resolve(&self, id: &UserId) -> Result<Principal, CyberShieldError>;
}

impl<S: IncidentStore> IdentityProvider for S {
    fn resolve(&self, id: &UserId) -> Result<Principal, CyberShieldError> {
        self.get_user(id)?
            .map(|user| user.principal())
            .ok_or_else(|| CyberShieldError::NotFound(format!("User {}", id)))
    }
}

/// A registration request for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl UserRegistration {
    #[must_use]
    pub fn reporter(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role: Role::Reporter,
        }
    }

    #[must_use]
    pub fn administrator(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        badge_number: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role: Role::Administrator {
                badge_number: badge_number.into(),
                department: department.into(),
            },
        }
    }

    /// Validate and normalise into a `User` created at `now`.
    pub fn into_user(self, now: Timestamp) -> Result<User, CyberShieldError> {
        let id = identity_field("id", &self.id)?;
        if id.chars().any(char::is_whitespace) {
            return Err(CyberShieldError::Validation(
                "id must not contain whitespace".to_string(),
            ));
        }
        let name = identity_field("name", &self.name)?;
        let email = validate_email(&self.email)?;

        let role = match self.role {
            Role::Reporter => Role::Reporter,
            Role::Administrator {
                badge_number,
                department,
            } => Role::Administrator {
                badge_number: identity_field("badge_number", &badge_number)?,
                department: department.trim().to_string(),
            },
        };

        Ok(User {
            id: UserId::new(id),
            email,
            name,
            role,
            created_at: now,
        })
    }
}

/// A change to a user's own profile.
///
/// Only `name` and `email` can change. The id and role are fixed at
/// registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    /// Validate and apply to `user`. Returns whether anything changed.
    pub fn apply(self, user: &mut User) -> Result<bool, CyberShieldError> {
        if self.name.is_none() && self.email.is_none() {
            return Err(CyberShieldError::Validation(
                "Profile update needs a name or an email".to_string(),
            ));
        }
        let name = self.name.map(|n| identity_field("name", &n)).transpose()?;
        let email = self.email.map(|e| validate_email(&e)).transpose()?;

        let mut changed = false;
        if let Some(name) = name.filter(|n| n != &user.name) {
            user.name = name;
            changed = true;
        }
        if let Some(email) = email.filter(|e| e != &user.email) {
            user.email = email;
            changed = true;
        }
        Ok(changed)
    }
}

fn identity_field(field: &str, value: &str) -> Result<String, CyberShieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CyberShieldError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > MAX_IDENTITY_FIELD_LENGTH {
        return Err(CyberShieldError::Validation(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            trimmed.len(),
            MAX_IDENTITY_FIELD_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Accepts `local@domain.tld` with no whitespace.
fn validate_email(email: &str) -> Result<String, CyberShieldError> {
    let email = identity_field("email", email)?;
    let invalid = || CyberShieldError::Validation(format!("Invalid email address: '{}'", email));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email.to_lowercase()),
        _ => Err(invalid()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[test]
    fn reporter_registration_normalises() {
        let user = UserRegistration::reporter(" U1 ", "Jane@Example.com", " Jane ")
            .into_user(Utc::now())
            .expect("valid");
        assert_eq!(user.id, UserId::new("U1"));
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "Jane");
        assert_eq!(user.role, Role::Reporter);
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["", "plain", "@x.com", "a@", "a@nodot", "a b@x.com", "a@b@c.com", "a@.com"] {
            let result = UserRegistration::reporter("U1", bad, "Jane").into_user(Utc::now());
            assert!(
                matches!(result, Err(CyberShieldError::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn administrator_needs_badge() {
        let result = UserRegistration::administrator("A1", "a1@agency.gov", "Agent", "  ", "Cyber")
            .into_user(Utc::now());
        assert!(matches!(result, Err(CyberShieldError::Validation(_))));
    }

    #[test]
    fn profile_update_changes_name_and_email_only() {
        let mut user = UserRegistration::administrator("A1", "a1@agency.gov", "Agent", "B-7", "Cyber")
            .into_user(Utc::now())
            .expect("valid");
        let update = ProfileUpdate {
            name: Some(" Senior Agent ".to_string()),
            email: Some("Agent@Agency.gov".to_string()),
        };

        assert!(update.apply(&mut user).expect("apply"));
        assert_eq!(user.name, "Senior Agent");
        assert_eq!(user.email, "agent@agency.gov");
        assert_eq!(user.principal(), Principal::admin("A1", "B-7", "Cyber"));
    }

    #[test]
    fn profile_update_rejects_empty_and_invalid() {
        let mut user = UserRegistration::reporter("U1", "u1@example.com", "Jane")
            .into_user(Utc::now())
            .expect("valid");
        let before = user.clone();

        assert!(ProfileUpdate::default().apply(&mut user).is_err());
        let bad_email = ProfileUpdate {
            name: Some("Janet".to_string()),
            email: Some("not-an-email".to_string()),
        };
        assert!(matches!(
            bad_email.apply(&mut user),
            Err(CyberShieldError::Validation(_))
        ));
        assert_eq!(user, before);
    }

    #[test]
    fn profile_update_with_same_values_is_unchanged() {
        let mut user = UserRegistration::reporter("U1", "u1@example.com", "Jane")
            .into_user(Utc::now())
            .expect("valid");
        let update = ProfileUpdate {
            name: Some("Jane".to_string()),
            email: None,
        };
        assert!(!update.apply(&mut user).expect("apply"));
    }

    #[test]
    fn resolve_known_and_unknown() {
        let mut store = MemoryStore::new();
        let admin = UserRegistration::administrator("A1", "a1@agency.gov", "Agent", "B-7", "Cyber")
            .into_user(Utc::now())
            .expect("valid");
        store.create_user(&admin).expect("create");

        assert_eq!(
            store.resolve(&UserId::new("A1")).expect("resolve"),
            Principal::admin("A1", "B-7", "Cyber")
        );
        assert!(matches!(
            store.resolve(&UserId::new("nobody")),
            Err(CyberShieldError::NotFound(_))
        ));
    }
}
