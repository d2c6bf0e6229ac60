//! Lesson-progress domain model.
//!
//! # Responsibility
//! - Track one (account, lesson) pair's completion state.
//!
//! # Invariants
//! - At most one record per (account, lesson) pair, enforced by the store's
//!   UNIQUE constraint.
//! - `completed_at` is `Some` iff `completed` is true. The before-persist
//!   hook computes it from the snapshot about to be written; callers only
//!   set the `completed` flag.

use crate::model::account::AccountId;
use crate::model::is_valid_lesson_slug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a lesson-progress record.
pub type ProgressId = Uuid;

/// Completion state for one lesson, per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    /// Stable global ID.
    pub uuid: ProgressId,
    /// Account this progress belongs to.
    pub account_uuid: AccountId,
    /// External lesson reference; the catalog lives outside this crate.
    pub lesson_slug: String,
    /// Authoritative completion flag set by callers.
    pub completed: bool,
    /// Unix epoch milliseconds. Derived from `completed` by the
    /// before-persist hook; `None` while the lesson is incomplete.
    pub completed_at: Option<i64>,
}

/// Field-level validation failures for `LessonProgress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressValidationError {
    InvalidLessonSlug(String),
}

impl Display for ProgressValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLessonSlug(value) => write!(f, "invalid lesson slug: `{value}`"),
        }
    }
}

impl Error for ProgressValidationError {}

impl LessonProgress {
    /// Creates an incomplete progress record with a generated stable ID.
    pub fn new(account_uuid: AccountId, lesson_slug: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), account_uuid, lesson_slug)
    }

    /// Creates an incomplete progress record with a caller-provided ID.
    pub fn with_id(
        uuid: ProgressId,
        account_uuid: AccountId,
        lesson_slug: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            account_uuid,
            lesson_slug: lesson_slug.into(),
            completed: false,
            completed_at: None,
        }
    }

    /// Checks field-level invariants before persistence.
    ///
    /// Timestamp/flag consistency is deliberately not checked here: callers
    /// may hand in an inconsistent pair and the before-persist hook repairs
    /// it prior to the write.
    pub fn validate(&self) -> Result<(), ProgressValidationError> {
        if !is_valid_lesson_slug(&self.lesson_slug) {
            return Err(ProgressValidationError::InvalidLessonSlug(
                self.lesson_slug.clone(),
            ));
        }
        Ok(())
    }

    /// Returns whether `completed_at` agrees with the `completed` flag.
    pub fn timestamp_matches_flag(&self) -> bool {
        self.completed == self.completed_at.is_some()
    }
}
