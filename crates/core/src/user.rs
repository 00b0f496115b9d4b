//! User account records exchanged with the user store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, UserId};

/// A persisted user row.
///
/// `password_hash` is a PHC string produced by the credential hasher; it never
/// leaves the server (see [`UserView`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public representation of a user (no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Longest accepted username, in characters.
pub const USERNAME_MAX_LEN: usize = 50;

/// Longest accepted email, in characters.
pub const EMAIL_MAX_LEN: usize = 100;

fn check_username(username: &str) -> DomainResult<()> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "username must be at most {USERNAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> DomainResult<()> {
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(DomainError::validation(format!(
            "email must be at most {EMAIL_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Fields required to create a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> DomainResult<Self> {
        let username = username.into();
        check_username(&username)?;
        let email = email.into();
        check_email(&email)?;
        let password_hash = password_hash.into();
        if password_hash.is_empty() {
            return Err(DomainError::validation("password hash must not be empty"));
        }
        Ok(Self {
            username,
            email,
            password_hash,
        })
    }
}

/// Partial update of a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    /// Build a patch, applying the same field rules as [`NewUser::new`].
    pub fn new(
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> DomainResult<Self> {
        if let Some(username) = &username {
            check_username(username)?;
        }
        if let Some(email) = &email {
            check_email(email)?;
        }
        Ok(Self {
            username,
            email,
            password_hash,
        })
    }

    /// Apply the patch to a record in place.
    pub fn apply_to(&self, record: &mut UserRecord) {
        if let Some(username) = &self.username {
            record.username = username.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            record.password_hash = hash.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: UserId::new(3).unwrap(),
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn view_drops_password_hash() {
        let json = serde_json::to_value(record().view()).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "ana");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn new_user_requires_username() {
        let err = NewUser::new("  ", "x@example.com", "hash").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let long_name = "n".repeat(USERNAME_MAX_LEN + 1);
        let err = NewUser::new(long_name.as_str(), "", "hash").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(NewUser::new("n".repeat(USERNAME_MAX_LEN), "", "hash").is_ok());

        let long_email = format!("{}@example.com", "e".repeat(EMAIL_MAX_LEN));
        assert!(NewUser::new("ana", long_email.as_str(), "hash").is_err());

        assert!(UserPatch::new(Some(long_name), None, None).is_err());
        assert!(UserPatch::new(None, Some(long_email), None).is_err());
        // Length is counted in characters, not bytes.
        assert!(UserPatch::new(Some("ñ".repeat(USERNAME_MAX_LEN)), None, None).is_ok());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut r = record();
        let patch = UserPatch {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut r);
        assert_eq!(r.username, "ana");
        assert_eq!(r.email, "new@example.com");
    }
}
