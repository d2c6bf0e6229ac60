//! Hook registry and synchronous dispatch.
//!
//! # Responsibility
//! - Keep the process-wide (entity kind, stage) -> handlers table.
//! - Dispatch lifecycle events deterministically, in registration order.
//!
//! # Invariants
//! - `register` only works before `seal()`; the table is read-only after.
//! - `dispatch` refuses to run against an unsealed registry, so traffic
//!   cannot start before bootstrap finished.
//! - Failed registration leaves the table unchanged.

use crate::model::account::Account;
use crate::model::profile::Profile;
use crate::model::progress::LessonProgress;
use crate::model::EntityKind;
use log::{debug, error};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Point in a single entity write where a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookStage {
    /// Pre-commit; the snapshot is still mutable toward the write.
    BeforePersist,
    /// Row written; further writes in the same transaction are allowed.
    AfterPersist,
}

impl Display for HookStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::BeforePersist => "before_persist",
            Self::AfterPersist => "after_persist",
        };
        write!(f, "{label}")
    }
}

/// Owned in-flight entity value passed through dispatch.
///
/// Before-persist handlers mutate it in place; the repository persists the
/// mutated value. After-persist handlers see the value as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitySnapshot {
    Account(Account),
    Profile(Profile),
    LessonProgress(LessonProgress),
}

impl EntitySnapshot {
    /// Returns which entity kind this snapshot carries.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Account(_) => EntityKind::Account,
            Self::Profile(_) => EntityKind::Profile,
            Self::LessonProgress(_) => EntityKind::LessonProgress,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Self::Account(account) => Some(account),
            _ => None,
        }
    }

    pub fn as_account_mut(&mut self) -> Option<&mut Account> {
        match self {
            Self::Account(account) => Some(account),
            _ => None,
        }
    }

    pub fn as_progress(&self) -> Option<&LessonProgress> {
        match self {
            Self::LessonProgress(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn as_progress_mut(&mut self) -> Option<&mut LessonProgress> {
        match self {
            Self::LessonProgress(progress) => Some(progress),
            _ => None,
        }
    }

    /// Unwraps the account value after dispatch.
    pub fn into_account(self) -> Option<Account> {
        match self {
            Self::Account(account) => Some(account),
            _ => None,
        }
    }

    /// Unwraps the progress value after dispatch.
    pub fn into_progress(self) -> Option<LessonProgress> {
        match self {
            Self::LessonProgress(progress) => Some(progress),
            _ => None,
        }
    }
}

/// Live write-path resources handed to each hook invocation.
///
/// Borrows the connection the surrounding write runs on, so after-persist
/// hooks issue their side-effect writes inside the same transaction.
pub struct HookContext<'a> {
    conn: &'a Connection,
}

impl<'a> HookContext<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &'a Connection {
        self.conn
    }
}

/// One registered side-effect handler.
///
/// Implementations must be cheap to call and must not block on anything
/// beyond the connection they are handed; dispatch is synchronous inside
/// the caller's write.
pub trait EntityHook: Send + Sync {
    /// Stable name used for duplicate detection and log events.
    fn name(&self) -> &'static str;

    /// Runs the hook against the in-flight snapshot.
    fn run(
        &self,
        ctx: &HookContext<'_>,
        snapshot: &mut EntitySnapshot,
        is_new: bool,
    ) -> Result<(), HookError>;
}

/// Configuration errors raised while populating the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookRegistryError {
    RegistrySealed {
        entity: EntityKind,
        stage: HookStage,
        hook: &'static str,
    },
    DuplicateHook {
        entity: EntityKind,
        stage: HookStage,
        hook: &'static str,
    },
}

impl Display for HookRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistrySealed {
                entity,
                stage,
                hook,
            } => write!(
                f,
                "registry is sealed; cannot register hook `{hook}` for ({entity}, {stage})"
            ),
            Self::DuplicateHook {
                entity,
                stage,
                hook,
            } => write!(
                f,
                "hook `{hook}` is already registered for ({entity}, {stage})"
            ),
        }
    }
}

impl Error for HookRegistryError {}

/// Failures raised while dispatching hooks for one write.
#[derive(Debug)]
pub enum HookError {
    /// Dispatch was attempted before bootstrap sealed the registry.
    RegistryOpen,
    /// A hook received a snapshot of the wrong entity kind.
    SnapshotMismatch {
        hook: &'static str,
        expected: EntityKind,
        actual: EntityKind,
    },
    /// A hook's side-effect write failed.
    SideEffect {
        hook: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistryOpen => {
                write!(f, "hook registry is not sealed; bootstrap must finish first")
            }
            Self::SnapshotMismatch {
                hook,
                expected,
                actual,
            } => write!(
                f,
                "hook `{hook}` expected a {expected} snapshot, got {actual}"
            ),
            Self::SideEffect { hook, source } => {
                write!(f, "hook `{hook}` side effect failed: {source}")
            }
        }
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SideEffect { source, .. } => Some(source.as_ref()),
            Self::RegistryOpen | Self::SnapshotMismatch { .. } => None,
        }
    }
}

type HookKey = (EntityKind, HookStage);

/// Process-wide lifecycle hook table.
///
/// Built mutably during bootstrap, sealed, then shared immutably (behind
/// `Arc`) by every repository. No locking is needed after sealing because
/// the table never changes again.
#[derive(Default)]
pub struct HookRegistry {
    entries: BTreeMap<HookKey, Vec<Arc<dyn EntityHook>>>,
    sealed: bool,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one hook to the list for (entity, stage).
    ///
    /// # Errors
    /// - `RegistrySealed` when called after `seal()`.
    /// - `DuplicateHook` when a hook with the same name is already
    ///   registered for that key. The table is unchanged on error.
    pub fn register(
        &mut self,
        entity: EntityKind,
        stage: HookStage,
        hook: Arc<dyn EntityHook>,
    ) -> Result<(), HookRegistryError> {
        let name = hook.name();
        if self.sealed {
            return Err(HookRegistryError::RegistrySealed {
                entity,
                stage,
                hook: name,
            });
        }

        let slot = self.entries.entry((entity, stage)).or_default();
        if slot.iter().any(|registered| registered.name() == name) {
            return Err(HookRegistryError::DuplicateHook {
                entity,
                stage,
                hook: name,
            });
        }

        slot.push(hook);
        Ok(())
    }

    /// Marks bootstrap as finished; the table is read-only afterwards.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns how many hooks are registered for one key.
    pub fn hook_count(&self, entity: EntityKind, stage: HookStage) -> usize {
        self.entries
            .get(&(entity, stage))
            .map_or(0, |hooks| hooks.len())
    }

    /// Total registered hooks across all keys.
    pub fn len(&self) -> usize {
        self.entries.values().map(|hooks| hooks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|hooks| hooks.is_empty())
    }

    /// Runs every hook registered for (entity, stage), in registration
    /// order, against the in-flight snapshot.
    ///
    /// The first hook failure aborts the remaining hooks and propagates to
    /// the caller, which must roll back the surrounding write.
    ///
    /// # Errors
    /// - `RegistryOpen` when the registry was never sealed.
    /// - Any error returned by a hook, unchanged.
    pub fn dispatch(
        &self,
        entity: EntityKind,
        stage: HookStage,
        snapshot: &mut EntitySnapshot,
        is_new: bool,
        ctx: &HookContext<'_>,
    ) -> Result<(), HookError> {
        if !self.sealed {
            return Err(HookError::RegistryOpen);
        }

        let Some(hooks) = self.entries.get(&(entity, stage)) else {
            return Ok(());
        };

        let started_at = Instant::now();
        for hook in hooks {
            if let Err(err) = hook.run(ctx, snapshot, is_new) {
                error!(
                    "event=hook_dispatch module=hooks status=error entity={entity} stage={stage} hook={} is_new={is_new} error={err}",
                    hook.name()
                );
                return Err(err);
            }
        }

        debug!(
            "event=hook_dispatch module=hooks status=ok entity={entity} stage={stage} hooks={} is_new={is_new} duration_ms={}",
            hooks.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EntityHook, EntitySnapshot, HookContext, HookError, HookRegistry, HookRegistryError,
        HookStage,
    };
    use crate::model::account::Account;
    use crate::model::profile::Profile;
    use crate::model::EntityKind;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct TraceHook {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl TraceHook {
        fn new(name: &'static str, trace: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                trace,
                fail: false,
            }
        }

        fn failing(name: &'static str, trace: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                trace,
                fail: true,
            }
        }
    }

    impl EntityHook for TraceHook {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(
            &self,
            _ctx: &HookContext<'_>,
            snapshot: &mut EntitySnapshot,
            _is_new: bool,
        ) -> Result<(), HookError> {
            if self.fail {
                return Err(HookError::SideEffect {
                    hook: self.name,
                    source: "simulated failure".into(),
                });
            }
            if let Some(account) = snapshot.as_account_mut() {
                // Leave a marker so the next hook can observe prior mutations.
                account.username.push_str(self.name);
            }
            self.trace
                .lock()
                .expect("trace lock should not be poisoned")
                .push(self.name.to_string());
            Ok(())
        }
    }

    fn account_snapshot() -> EntitySnapshot {
        EntitySnapshot::Account(Account::new("u-", "u@example.com"))
    }

    fn test_conn() -> Connection {
        Connection::open_in_memory().expect("in-memory connection should open")
    }

    #[test]
    fn dispatch_runs_hooks_in_registration_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("h1", trace.clone())),
            )
            .expect("h1 should register");
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("h2", trace.clone())),
            )
            .expect("h2 should register");
        registry.seal();

        let conn = test_conn();
        let mut snapshot = account_snapshot();
        registry
            .dispatch(
                EntityKind::Account,
                HookStage::AfterPersist,
                &mut snapshot,
                true,
                &HookContext::new(&conn),
            )
            .expect("dispatch should succeed");

        let order = trace.lock().expect("trace lock").clone();
        assert_eq!(order, vec!["h1".to_string(), "h2".to_string()]);
        // h2 ran against the snapshot h1 already mutated.
        let account = snapshot.into_account().expect("account snapshot");
        assert_eq!(account.username, "u-h1h2");
    }

    #[test]
    fn dispatch_stops_at_first_failing_hook() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::failing("boom", trace.clone())),
            )
            .expect("failing hook should register");
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("after", trace.clone())),
            )
            .expect("second hook should register");
        registry.seal();

        let conn = test_conn();
        let mut snapshot = account_snapshot();
        let err = registry
            .dispatch(
                EntityKind::Account,
                HookStage::AfterPersist,
                &mut snapshot,
                true,
                &HookContext::new(&conn),
            )
            .expect_err("dispatch should propagate the failure");

        assert!(matches!(err, HookError::SideEffect { hook: "boom", .. }));
        assert!(trace.lock().expect("trace lock").is_empty());
    }

    #[test]
    fn register_after_seal_fails_and_leaves_registry_unchanged() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("h1", trace.clone())),
            )
            .expect("h1 should register");
        registry.seal();

        let err = registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("late", trace)),
            )
            .expect_err("registration after seal must fail");
        assert!(matches!(
            err,
            HookRegistryError::RegistrySealed { hook: "late", .. }
        ));
        assert_eq!(
            registry.hook_count(EntityKind::Account, HookStage::AfterPersist),
            1
        );
    }

    #[test]
    fn duplicate_hook_name_for_same_key_is_rejected() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("h1", trace.clone())),
            )
            .expect("first registration should succeed");
        let err = registry
            .register(
                EntityKind::Account,
                HookStage::AfterPersist,
                Arc::new(TraceHook::new("h1", trace.clone())),
            )
            .expect_err("duplicate name must be rejected");
        assert!(matches!(
            err,
            HookRegistryError::DuplicateHook { hook: "h1", .. }
        ));

        // Same name under a different key is a different registration.
        registry
            .register(
                EntityKind::Account,
                HookStage::BeforePersist,
                Arc::new(TraceHook::new("h1", trace)),
            )
            .expect("same name under another key should register");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dispatch_on_unsealed_registry_is_a_configuration_error() {
        let registry = HookRegistry::new();
        let conn = test_conn();
        let mut snapshot = account_snapshot();
        let err = registry
            .dispatch(
                EntityKind::Account,
                HookStage::BeforePersist,
                &mut snapshot,
                true,
                &HookContext::new(&conn),
            )
            .expect_err("unsealed registry must refuse dispatch");
        assert!(matches!(err, HookError::RegistryOpen));
    }

    #[test]
    fn dispatch_with_no_hooks_for_key_is_a_no_op() {
        let mut registry = HookRegistry::new();
        registry.seal();

        let conn = test_conn();
        let mut snapshot = EntitySnapshot::Profile(Profile::for_account(Uuid::new_v4()));
        registry
            .dispatch(
                EntityKind::Profile,
                HookStage::BeforePersist,
                &mut snapshot,
                false,
                &HookContext::new(&conn),
            )
            .expect("empty key should dispatch as a no-op");
        assert!(registry.is_empty());
    }
}
