//! Profile domain model.
//!
//! # Responsibility
//! - Define the companion record provisioned once per account.
//!
//! # Invariants
//! - `account_uuid` is unique: at most one profile per account, enforced by
//!   the store's UNIQUE constraint.
//! - Profiles are created only by the account after-persist hook; deletion
//!   happens only as a cascade of account deletion.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MAX_DISPLAY_NAME_CHARS: usize = 200;

/// Stable identifier for a profile.
pub type ProfileId = Uuid;

/// Free-form companion metadata owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable global ID.
    pub uuid: ProfileId,
    /// Owning account. One-to-one, never reassigned.
    pub account_uuid: AccountId,
    /// Optional public name. Empty means "fall back to username".
    pub display_name: String,
    /// Optional free-form biography.
    pub bio: String,
}

/// Field-level validation failures for `Profile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    DisplayNameTooLong { chars: usize, max: usize },
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DisplayNameTooLong { chars, max } => write!(
                f,
                "profile display name has {chars} chars, limit is {max}"
            ),
        }
    }
}

impl Error for ProfileValidationError {}

impl Profile {
    /// Creates an empty profile for `account_uuid` with a generated ID.
    ///
    /// This is what the provisioning hook stores: default/empty metadata,
    /// to be filled in by the user later.
    pub fn for_account(account_uuid: AccountId) -> Self {
        Self::with_id(Uuid::new_v4(), account_uuid)
    }

    /// Creates an empty profile with a caller-provided stable ID.
    pub fn with_id(uuid: ProfileId, account_uuid: AccountId) -> Self {
        Self {
            uuid,
            account_uuid,
            display_name: String::new(),
            bio: String::new(),
        }
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        let chars = self.display_name.chars().count();
        if chars > MAX_DISPLAY_NAME_CHARS {
            return Err(ProfileValidationError::DisplayNameTooLong {
                chars,
                max: MAX_DISPLAY_NAME_CHARS,
            });
        }
        Ok(())
    }
}
