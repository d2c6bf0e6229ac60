//! Built-in lifecycle hooks.
//!
//! # Responsibility
//! - Provision exactly one profile per newly created account.
//! - Keep `completed_at` synchronized with the `completed` flag on
//!   lesson-progress writes.
//!
//! # Invariants
//! - The timestamp hook is a pure function of the snapshot plus one clock
//!   read; it never consults previously stored state.
//! - Profile creation happens only here, never in repository or service
//!   code.

use crate::hooks::registry::{EntityHook, EntitySnapshot, HookContext, HookError};
use crate::model::profile::Profile;
use crate::model::EntityKind;
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use log::{debug, info};
use std::time::{SystemTime, UNIX_EPOCH};

pub const PROVISION_PROFILE_HOOK: &str = "provision_profile";
pub const TOUCH_PROFILE_HOOK: &str = "touch_profile";
pub const COMPLETION_TIMESTAMP_HOOK: &str = "completion_timestamp";

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn snapshot_mismatch(hook: &'static str, expected: EntityKind, snapshot: &EntitySnapshot) -> HookError {
    HookError::SnapshotMismatch {
        hook,
        expected,
        actual: snapshot.kind(),
    }
}

/// (Account, after-persist): creates the companion profile on first
/// creation, does nothing on updates.
///
/// Because it only acts when `is_new` is true it runs at most once per
/// account; a pre-existing profile would surface as the store's uniqueness
/// violation, propagated as a hook side-effect failure.
pub struct ProvisionProfileHook;

impl EntityHook for ProvisionProfileHook {
    fn name(&self) -> &'static str {
        PROVISION_PROFILE_HOOK
    }

    fn run(
        &self,
        ctx: &HookContext<'_>,
        snapshot: &mut EntitySnapshot,
        is_new: bool,
    ) -> Result<(), HookError> {
        let account = snapshot
            .as_account()
            .ok_or_else(|| snapshot_mismatch(PROVISION_PROFILE_HOOK, EntityKind::Account, snapshot))?;

        if !is_new {
            return Ok(());
        }

        let profile = Profile::for_account(account.uuid);
        let repo = SqliteProfileRepository::new(ctx.conn());
        repo.create_profile(&profile)
            .map_err(|err| HookError::SideEffect {
                hook: PROVISION_PROFILE_HOOK,
                source: Box::new(err),
            })?;

        info!(
            "event=profile_provisioned module=hooks status=ok account={} profile={}",
            account.uuid, profile.uuid
        );
        Ok(())
    }
}

/// (Account, after-persist): bumps the companion profile's `updated_at` on
/// every account write.
///
/// Registered after `ProvisionProfileHook`, so on creation it observes the
/// profile the previous hook just made. When no profile exists (an account
/// imported before provisioning was introduced) it is a no-op.
pub struct TouchProfileHook;

impl EntityHook for TouchProfileHook {
    fn name(&self) -> &'static str {
        TOUCH_PROFILE_HOOK
    }

    fn run(
        &self,
        ctx: &HookContext<'_>,
        snapshot: &mut EntitySnapshot,
        _is_new: bool,
    ) -> Result<(), HookError> {
        let account = snapshot
            .as_account()
            .ok_or_else(|| snapshot_mismatch(TOUCH_PROFILE_HOOK, EntityKind::Account, snapshot))?;

        let repo = SqliteProfileRepository::new(ctx.conn());
        let touched = repo
            .touch_for_account(account.uuid)
            .map_err(|err| HookError::SideEffect {
                hook: TOUCH_PROFILE_HOOK,
                source: Box::new(err),
            })?;

        if !touched {
            debug!(
                "event=profile_touch module=hooks status=skipped account={} reason=no_profile",
                account.uuid
            );
        }
        Ok(())
    }
}

/// (LessonProgress, before-persist): derives `completed_at` from the
/// `completed` flag on the snapshot about to be written.
///
/// - completed and no timestamp: stamp with the current time.
/// - completed and already stamped: leave the timestamp alone.
/// - not completed: clear the timestamp.
pub struct CompletionTimestampHook;

impl EntityHook for CompletionTimestampHook {
    fn name(&self) -> &'static str {
        COMPLETION_TIMESTAMP_HOOK
    }

    fn run(
        &self,
        _ctx: &HookContext<'_>,
        snapshot: &mut EntitySnapshot,
        _is_new: bool,
    ) -> Result<(), HookError> {
        let mismatch =
            snapshot_mismatch(COMPLETION_TIMESTAMP_HOOK, EntityKind::LessonProgress, snapshot);
        let progress = snapshot.as_progress_mut().ok_or(mismatch)?;

        if progress.completed {
            if progress.completed_at.is_none() {
                progress.completed_at = Some(now_epoch_ms());
            }
        } else if progress.completed_at.is_some() {
            progress.completed_at = None;
        }
        Ok(())
    }
}
