//! Account use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for account registration and lookup.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Profile provisioning is never done here; it happens inside the
//!   repository write via the after-persist hook.

use crate::model::account::{Account, AccountId};
use crate::model::profile::Profile;
use crate::repo::account_repo::AccountRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoResult;

/// Use-case service wrapper for account operations.
pub struct AccountService<A: AccountRepository, P: ProfileRepository> {
    accounts: A,
    profiles: P,
}

impl<A: AccountRepository, P: ProfileRepository> AccountService<A, P> {
    /// Creates a service using the provided repository implementations.
    pub fn new(accounts: A, profiles: P) -> Self {
        Self { accounts, profiles }
    }

    /// Registers a new account and returns it as persisted.
    ///
    /// # Contract
    /// - The companion profile exists by the time this returns.
    /// - The returned value reflects any before-persist hook mutations.
    pub fn register_account(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> RepoResult<Account> {
        let account = Account::new(username, email);
        self.accounts.create_account(&account)
    }

    /// Updates an existing account by stable ID and returns it as written.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn update_account(&self, account: &Account) -> RepoResult<Account> {
        self.accounts.update_account(account)
    }

    /// Gets one account by ID.
    pub fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.accounts.get_account(id)
    }

    /// Gets the companion profile for an account.
    pub fn get_profile(&self, account: AccountId) -> RepoResult<Option<Profile>> {
        self.profiles.get_profile_for_account(account)
    }

    /// Saves user-edited profile metadata.
    pub fn update_profile(&self, profile: &Profile) -> RepoResult<()> {
        self.profiles.update_profile(profile)
    }
}
