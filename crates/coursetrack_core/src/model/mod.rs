//! Domain model for account, profile and lesson-progress records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Name the entity kinds the lifecycle hook system keys on.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - `LessonProgress.completed_at` is set iff `completed` is true; the
//!   before-persist hook is the only writer of that field.
//!
//! # See also
//! - docs/architecture/data-model.md

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod account;
pub mod profile;
pub mod progress;

/// Named category of record, used as the hook registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Identity entity owned by the external auth collaborator.
    Account,
    /// Companion entity, one per account, provisioned by the core.
    Profile,
    /// One (account, lesson) completion record.
    LessonProgress,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Account => "account",
            Self::Profile => "profile",
            Self::LessonProgress => "lesson_progress",
        };
        write!(f, "{label}")
    }
}

static LESSON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid lesson slug regex"));

/// Returns whether `value` is an acceptable lesson slug.
///
/// Slugs are lowercase ASCII letters and digits with single internal
/// hyphens, e.g. `intro-to-sql`. The lesson catalog itself lives outside
/// this crate; the slug is the stable external reference.
pub fn is_valid_lesson_slug(value: &str) -> bool {
    LESSON_SLUG_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::is_valid_lesson_slug;

    #[test]
    fn accepts_plain_and_hyphenated_slugs() {
        assert!(is_valid_lesson_slug("intro"));
        assert!(is_valid_lesson_slug("intro-to-sql"));
        assert!(is_valid_lesson_slug("lesson-2"));
    }

    #[test]
    fn rejects_empty_uppercase_and_malformed_slugs() {
        assert!(!is_valid_lesson_slug(""));
        assert!(!is_valid_lesson_slug("Intro"));
        assert!(!is_valid_lesson_slug("intro--to"));
        assert!(!is_valid_lesson_slug("-intro"));
        assert!(!is_valid_lesson_slug("intro-"));
        assert!(!is_valid_lesson_slug("intro to sql"));
    }
}
