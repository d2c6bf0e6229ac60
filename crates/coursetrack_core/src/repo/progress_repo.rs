//! Lesson-progress repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-account lesson completion records.
//! - Raise before/after-persist events for every progress write.
//!
//! # Invariants
//! - UNIQUE(account_uuid, lesson_slug) is enforced by the store; callers
//!   wanting upsert semantics go through `ProgressService`.
//! - Write APIs return the record as written, i.e. after before-persist
//!   hooks derived `completed_at`; callers never need to re-read it.

use crate::hooks::registry::{EntitySnapshot, HookContext, HookRegistry, HookStage};
use crate::model::account::AccountId;
use crate::model::progress::LessonProgress;
use crate::model::EntityKind;
use crate::repo::{bool_to_int, parse_bool_column, parse_uuid_column, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PROGRESS_SELECT_SQL: &str =
    "SELECT uuid, account_uuid, lesson_slug, completed, completed_at FROM lesson_progress";

/// Repository interface for lesson-progress persistence.
pub trait ProgressRepository {
    fn create_progress(&self, progress: &LessonProgress) -> RepoResult<LessonProgress>;
    fn update_progress(&self, progress: &LessonProgress) -> RepoResult<LessonProgress>;
    fn get_progress(
        &self,
        account: AccountId,
        lesson_slug: &str,
    ) -> RepoResult<Option<LessonProgress>>;
    fn list_for_account(&self, account: AccountId) -> RepoResult<Vec<LessonProgress>>;
    /// Counts completed records for `account` among the given slugs.
    fn count_completed(&self, account: AccountId, lesson_slugs: &[&str]) -> RepoResult<u32>;
}

/// SQLite-backed lesson-progress repository wired to the hook registry.
pub struct SqliteProgressRepository<'a> {
    conn: &'a Connection,
    hooks: &'a HookRegistry,
}

impl<'a> SqliteProgressRepository<'a> {
    pub fn new(conn: &'a Connection, hooks: &'a HookRegistry) -> Self {
        Self { conn, hooks }
    }

    fn persist(&self, progress: &LessonProgress, is_new: bool) -> RepoResult<LessonProgress> {
        progress.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let ctx = HookContext::new(&tx);
        let mut snapshot = EntitySnapshot::LessonProgress(progress.clone());

        self.hooks.dispatch(
            EntityKind::LessonProgress,
            HookStage::BeforePersist,
            &mut snapshot,
            is_new,
            &ctx,
        )?;

        let persisted = snapshot.as_progress().cloned().ok_or_else(|| {
            RepoError::InvalidData("progress snapshot changed kind during dispatch".to_string())
        })?;

        if is_new {
            tx.execute(
                "INSERT INTO lesson_progress
                    (uuid, account_uuid, lesson_slug, completed, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    persisted.uuid.to_string(),
                    persisted.account_uuid.to_string(),
                    persisted.lesson_slug.as_str(),
                    bool_to_int(persisted.completed),
                    persisted.completed_at,
                ],
            )?;
        } else {
            let changed = tx.execute(
                "UPDATE lesson_progress
                 SET
                    completed = ?1,
                    completed_at = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?3;",
                params![
                    bool_to_int(persisted.completed),
                    persisted.completed_at,
                    persisted.uuid.to_string(),
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: EntityKind::LessonProgress,
                    id: persisted.uuid,
                });
            }
        }

        self.hooks.dispatch(
            EntityKind::LessonProgress,
            HookStage::AfterPersist,
            &mut snapshot,
            is_new,
            &ctx,
        )?;

        tx.commit()?;
        Ok(persisted)
    }
}

impl ProgressRepository for SqliteProgressRepository<'_> {
    fn create_progress(&self, progress: &LessonProgress) -> RepoResult<LessonProgress> {
        self.persist(progress, true)
    }

    fn update_progress(&self, progress: &LessonProgress) -> RepoResult<LessonProgress> {
        self.persist(progress, false)
    }

    fn get_progress(
        &self,
        account: AccountId,
        lesson_slug: &str,
    ) -> RepoResult<Option<LessonProgress>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROGRESS_SELECT_SQL} WHERE account_uuid = ?1 AND lesson_slug = ?2;"
        ))?;

        let mut rows = stmt.query(params![account.to_string(), lesson_slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_progress_row(row)?));
        }

        Ok(None)
    }

    fn list_for_account(&self, account: AccountId) -> RepoResult<Vec<LessonProgress>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROGRESS_SELECT_SQL} WHERE account_uuid = ?1 ORDER BY lesson_slug ASC;"
        ))?;

        let mut rows = stmt.query([account.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_progress_row(row)?);
        }

        Ok(records)
    }

    fn count_completed(&self, account: AccountId, lesson_slugs: &[&str]) -> RepoResult<u32> {
        if lesson_slugs.is_empty() {
            return Ok(0);
        }

        let placeholders = (2..=lesson_slugs.len() + 1)
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM lesson_progress
             WHERE account_uuid = ?1 AND completed = 1 AND lesson_slug IN ({placeholders});"
        );

        let mut bind_values: Vec<Value> = Vec::with_capacity(lesson_slugs.len() + 1);
        bind_values.push(Value::Text(account.to_string()));
        for slug in lesson_slugs {
            bind_values.push(Value::Text((*slug).to_string()));
        }

        let count = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| {
                row.get::<_, u32>(0)
            })?;
        Ok(count)
    }
}

fn parse_progress_row(row: &Row<'_>) -> RepoResult<LessonProgress> {
    let uuid_text: String = row.get("uuid")?;
    let account_text: String = row.get("account_uuid")?;
    let completed = parse_bool_column(row.get("completed")?, "lesson_progress.completed")?;

    let progress = LessonProgress {
        uuid: parse_uuid_column(&uuid_text, "lesson_progress.uuid")?,
        account_uuid: parse_uuid_column(&account_text, "lesson_progress.account_uuid")?,
        lesson_slug: row.get("lesson_slug")?,
        completed,
        completed_at: row.get("completed_at")?,
    };
    progress.validate()?;
    Ok(progress)
}
