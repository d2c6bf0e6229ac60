//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the one-per-account companion profile.
//!
//! # Invariants
//! - `profiles.account_uuid` is UNIQUE; a second provisioning attempt for
//!   the same account fails at the store and surfaces to the caller.
//! - Profile writes do not dispatch lifecycle events: the profile is
//!   itself a hook side effect, not a hooked entity kind.

use crate::model::account::AccountId;
use crate::model::profile::{Profile, ProfileId};
use crate::model::EntityKind;
use crate::repo::{parse_uuid_column, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PROFILE_SELECT_SQL: &str =
    "SELECT uuid, account_uuid, display_name, bio FROM profiles";

/// Repository interface for profile persistence.
pub trait ProfileRepository {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId>;
    fn update_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn get_profile_for_account(&self, account: AccountId) -> RepoResult<Option<Profile>>;
    /// Bumps `updated_at` for the account's profile. Returns whether a
    /// profile row existed.
    fn touch_for_account(&self, account: AccountId) -> RepoResult<bool>;
    fn count_for_account(&self, account: AccountId) -> RepoResult<u32>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId> {
        profile.validate()?;

        self.conn.execute(
            "INSERT INTO profiles (uuid, account_uuid, display_name, bio)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                profile.uuid.to_string(),
                profile.account_uuid.to_string(),
                profile.display_name.as_str(),
                profile.bio.as_str(),
            ],
        )?;

        Ok(profile.uuid)
    }

    fn update_profile(&self, profile: &Profile) -> RepoResult<()> {
        profile.validate()?;

        let changed = self.conn.execute(
            "UPDATE profiles
             SET
                display_name = ?1,
                bio = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3;",
            params![
                profile.display_name.as_str(),
                profile.bio.as_str(),
                profile.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Profile,
                id: profile.uuid,
            });
        }

        Ok(())
    }

    fn get_profile_for_account(&self, account: AccountId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE account_uuid = ?1;"))?;

        let mut rows = stmt.query([account.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }

        Ok(None)
    }

    fn touch_for_account(&self, account: AccountId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE profiles
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE account_uuid = ?1;",
            [account.to_string()],
        )?;

        Ok(changed > 0)
    }

    fn count_for_account(&self, account: AccountId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE account_uuid = ?1;",
            [account.to_string()],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let uuid_text: String = row.get("uuid")?;
    let account_text: String = row.get("account_uuid")?;

    let profile = Profile {
        uuid: parse_uuid_column(&uuid_text, "profiles.uuid")?,
        account_uuid: parse_uuid_column(&account_text, "profiles.account_uuid")?,
        display_name: row.get("display_name")?,
        bio: row.get("bio")?,
    };
    profile.validate()?;
    Ok(profile)
}
