//! User domain model.
//!
//! Users are created out-of-band (seed data or account creation) and are
//! read-only from the core's perspective.

use crate::model::{ensure_id, UserId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Dashboard role shown next to the user's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    User,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::User => "user",
        }
    }
}

/// Registered dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Avatar image reference (URL or asset path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar: None,
        }
    }

    /// Two-letter uppercase fallback shown when no avatar is available.
    pub fn initials(&self) -> String {
        self.name.trim().chars().take(2).collect::<String>().to_uppercase()
    }

    /// Checks id, name and email shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.id, "user id")?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankUserName);
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserRole};
    use crate::model::ValidationError;

    #[test]
    fn validate_accepts_well_formed_user() {
        let user = User::new("user-1", "Ada Lovelace", "ada@example.com", UserRole::Admin);
        assert!(user.validate().is_ok());
        assert_eq!(user.initials(), "AD");
    }

    #[test]
    fn validate_rejects_bad_email_and_blank_name() {
        let bad_email = User::new("user-1", "Ada", "not-an-email", UserRole::User);
        assert_eq!(
            bad_email.validate().expect_err("email must be rejected"),
            ValidationError::InvalidEmail("not-an-email".to_string())
        );

        let blank_name = User::new("user-1", "  ", "ada@example.com", UserRole::User);
        assert_eq!(
            blank_name.validate().expect_err("name must be rejected"),
            ValidationError::BlankUserName
        );
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&UserRole::Manager).expect("role serializes");
        assert_eq!(json, "\"manager\"");
    }
}
