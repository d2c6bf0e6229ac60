//! Lesson-progress use-case service.
//!
//! # Responsibility
//! - Provide upsert semantics over the one-record-per-(account, lesson)
//!   constraint.
//! - Aggregate completion share across a caller-supplied lesson set.
//!
//! # Invariants
//! - `record_progress` only sets the `completed` flag; `completed_at` is
//!   derived by the before-persist hook during the write.

use crate::model::account::AccountId;
use crate::model::progress::LessonProgress;
use crate::repo::progress_repo::ProgressRepository;
use crate::repo::RepoResult;

/// Use-case service wrapper for lesson-progress operations.
pub struct ProgressService<R: ProgressRepository> {
    repo: R,
}

impl<R: ProgressRepository> ProgressService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates or updates the (account, lesson) record with the given flag.
    ///
    /// # Contract
    /// - First write for the pair inserts; later writes update in place.
    /// - Returns the record as written, with `completed_at` already
    ///   derived from `completed`.
    pub fn record_progress(
        &self,
        account: AccountId,
        lesson_slug: &str,
        completed: bool,
    ) -> RepoResult<LessonProgress> {
        match self.repo.get_progress(account, lesson_slug)? {
            Some(mut existing) => {
                existing.completed = completed;
                self.repo.update_progress(&existing)
            }
            None => {
                let mut progress = LessonProgress::new(account, lesson_slug);
                progress.completed = completed;
                self.repo.create_progress(&progress)
            }
        }
    }

    /// Gets one progress record by (account, lesson).
    pub fn get_progress(
        &self,
        account: AccountId,
        lesson_slug: &str,
    ) -> RepoResult<Option<LessonProgress>> {
        self.repo.get_progress(account, lesson_slug)
    }

    /// Lists all progress records for one account.
    pub fn list_for_account(&self, account: AccountId) -> RepoResult<Vec<LessonProgress>> {
        self.repo.list_for_account(account)
    }

    /// Share of the given lessons the account has completed, as a
    /// percentage rounded to two decimal places.
    ///
    /// Duplicate slugs are counted once; an empty lesson set yields 0.0.
    pub fn completion_percent(
        &self,
        account: AccountId,
        lesson_slugs: &[&str],
    ) -> RepoResult<f64> {
        let mut unique = lesson_slugs.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(0.0);
        }

        let completed = self.repo.count_completed(account, &unique)?;
        let share = f64::from(completed) / unique.len() as f64 * 100.0;
        Ok((share * 100.0).round() / 100.0)
    }
}
