//! Account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable create/update/read APIs over `accounts` storage.
//! - Raise before/after-persist events for every account write.
//!
//! # Invariants
//! - Write paths call `Account::validate()` before any dispatch or SQL.
//! - Primary write and after-persist side effects share one transaction;
//!   a hook failure rolls back the account write too, so an account is
//!   never durable without its profile.

use crate::hooks::registry::{EntitySnapshot, HookContext, HookRegistry, HookStage};
use crate::model::account::{Account, AccountId};
use crate::model::EntityKind;
use crate::repo::{bool_to_int, parse_bool_column, parse_uuid_column, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ACCOUNT_SELECT_SQL: &str = "SELECT uuid, username, email, is_active FROM accounts";

/// Repository interface for account persistence.
///
/// Write APIs return the account as written, i.e. after before-persist
/// hooks had their chance to mutate the snapshot, mirroring the
/// lesson-progress contract.
pub trait AccountRepository {
    fn create_account(&self, account: &Account) -> RepoResult<Account>;
    fn update_account(&self, account: &Account) -> RepoResult<Account>;
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
}

/// SQLite-backed account repository wired to the hook registry.
pub struct SqliteAccountRepository<'a> {
    conn: &'a Connection,
    hooks: &'a HookRegistry,
}

impl<'a> SqliteAccountRepository<'a> {
    pub fn new(conn: &'a Connection, hooks: &'a HookRegistry) -> Self {
        Self { conn, hooks }
    }

    fn persist(&self, account: &Account, is_new: bool) -> RepoResult<Account> {
        account.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let ctx = HookContext::new(&tx);
        let mut snapshot = EntitySnapshot::Account(account.clone());

        self.hooks.dispatch(
            EntityKind::Account,
            HookStage::BeforePersist,
            &mut snapshot,
            is_new,
            &ctx,
        )?;

        let persisted = snapshot
            .as_account()
            .cloned()
            .ok_or_else(snapshot_kind_changed)?;

        if is_new {
            tx.execute(
                "INSERT INTO accounts (uuid, username, email, is_active)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    persisted.uuid.to_string(),
                    persisted.username.as_str(),
                    persisted.email.as_str(),
                    bool_to_int(persisted.is_active),
                ],
            )?;
        } else {
            let changed = tx.execute(
                "UPDATE accounts
                 SET
                    username = ?1,
                    email = ?2,
                    is_active = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?4;",
                params![
                    persisted.username.as_str(),
                    persisted.email.as_str(),
                    bool_to_int(persisted.is_active),
                    persisted.uuid.to_string(),
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::Account,
                    id: persisted.uuid,
                });
            }
        }

        self.hooks.dispatch(
            EntityKind::Account,
            HookStage::AfterPersist,
            &mut snapshot,
            is_new,
            &ctx,
        )?;

        tx.commit()?;
        Ok(persisted)
    }
}

fn snapshot_kind_changed() -> RepoError {
    RepoError::InvalidData("account snapshot changed kind during dispatch".to_string())
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, account: &Account) -> RepoResult<Account> {
        self.persist(account, true)
    }

    fn update_account(&self, account: &Account) -> RepoResult<Account> {
        self.persist(account, false)
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }

        Ok(None)
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid_column(&uuid_text, "accounts.uuid")?;
    let is_active = parse_bool_column(row.get("is_active")?, "accounts.is_active")?;

    let account = Account {
        uuid,
        username: row.get("username")?,
        email: row.get("email")?,
        is_active,
    };
    account.validate()?;
    Ok(account)
}
