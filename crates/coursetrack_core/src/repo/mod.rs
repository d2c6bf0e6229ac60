//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service/business orchestration.
//! - Act as the lifecycle event source: every hooked write dispatches
//!   before/after-persist events through the hook registry.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Each hooked write runs inside one transaction: before-dispatch, SQL
//!   write, after-dispatch, commit. A failure anywhere rolls back the
//!   whole write.

use crate::db::DbError;
use crate::hooks::registry::HookError;
use crate::model::account::AccountValidationError;
use crate::model::profile::ProfileValidationError;
use crate::model::progress::ProgressValidationError;
use crate::model::EntityKind;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod account_repo;
pub mod profile_repo;
pub mod progress_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    AccountValidation(AccountValidationError),
    ProfileValidation(ProfileValidationError),
    ProgressValidation(ProgressValidationError),
    Db(DbError),
    /// A lifecycle hook failed; the surrounding write was rolled back.
    Hook(HookError),
    NotFound { entity: EntityKind, id: Uuid },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountValidation(err) => write!(f, "{err}"),
            Self::ProfileValidation(err) => write!(f, "{err}"),
            Self::ProgressValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Hook(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AccountValidation(err) => Some(err),
            Self::ProfileValidation(err) => Some(err),
            Self::ProgressValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Hook(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<AccountValidationError> for RepoError {
    fn from(value: AccountValidationError) -> Self {
        Self::AccountValidation(value)
    }
}

impl From<ProfileValidationError> for RepoError {
    fn from(value: ProfileValidationError) -> Self {
        Self::ProfileValidation(value)
    }
}

impl From<ProgressValidationError> for RepoError {
    fn from(value: ProgressValidationError) -> Self {
        Self::ProgressValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<HookError> for RepoError {
    fn from(value: HookError) -> Self {
        Self::Hook(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool_column(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_uuid_column(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
