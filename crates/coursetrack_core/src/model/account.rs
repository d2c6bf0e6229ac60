//! Account domain model.
//!
//! # Responsibility
//! - Define the identity record the core reacts to but does not own.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another account.
//! - Creation of the companion profile is driven by the after-persist hook,
//!   never by account code itself.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an account.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type AccountId = Uuid;

/// Identity record created by the external auth collaborator.
///
/// Credentials beyond the identity fields below are out of scope for this
/// crate; the core only needs enough shape to persist and react to writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable global ID used for linking and auditing.
    pub uuid: AccountId,
    /// Unique login name. Must be non-empty.
    pub username: String,
    /// Contact address. Must contain `@`.
    pub email: String,
    /// Deactivated accounts keep their rows and their profile.
    pub is_active: bool,
}

/// Field-level validation failures for `Account`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyUsername,
    InvalidEmail(String),
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "account username cannot be empty"),
            Self::InvalidEmail(value) => write!(f, "account email is invalid: {value}"),
        }
    }
}

impl Error for AccountValidationError {}

impl Account {
    /// Creates a new account with a generated stable ID.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username, email)
    }

    /// Creates an account with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        uuid: AccountId,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            username: username.into(),
            email: email.into(),
            is_active: true,
        }
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.username.trim().is_empty() {
            return Err(AccountValidationError::EmptyUsername);
        }
        if !self.email.contains('@') {
            return Err(AccountValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Account, AccountValidationError};

    #[test]
    fn new_account_is_active_and_valid() {
        let account = Account::new("ada", "ada@example.com");
        assert!(account.is_active);
        assert!(account.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_username() {
        let account = Account::new("   ", "ada@example.com");
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::EmptyUsername)
        );
    }

    #[test]
    fn validate_rejects_email_without_at_sign() {
        let account = Account::new("ada", "not-an-email");
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn account_serializes_with_snake_case_fields() {
        let account = Account::new("ada", "ada@example.com");
        let json = serde_json::to_value(&account).expect("account should serialize");
        assert_eq!(json["username"], "ada");
        assert_eq!(json["is_active"], true);
    }
}
