//! Core domain logic for coursetrack.
//! This crate is the single source of truth for business invariants.
//!
//! Entity writes flow through repositories, which raise before/after
//! lifecycle events against a process-wide [`hooks::registry::HookRegistry`].
//! The registered hooks keep two invariants without any call-site help:
//! every account has exactly one profile, and a lesson's completion
//! timestamp always agrees with its completion flag.

pub mod db;
pub mod hooks;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use hooks::bootstrap::build_default_registry;
pub use hooks::handlers::{
    CompletionTimestampHook, ProvisionProfileHook, TouchProfileHook,
};
pub use hooks::registry::{
    EntityHook, EntitySnapshot, HookContext, HookError, HookRegistry, HookRegistryError,
    HookStage,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, AccountId, AccountValidationError};
pub use model::profile::{Profile, ProfileId, ProfileValidationError};
pub use model::progress::{LessonProgress, ProgressId, ProgressValidationError};
pub use model::EntityKind;
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::progress_repo::{ProgressRepository, SqliteProgressRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::AccountService;
pub use service::progress_service::ProgressService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
