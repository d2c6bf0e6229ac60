//! Deterministic hook registration at process start.
//!
//! # Responsibility
//! - Register the built-in hooks in a fixed, documented order.
//! - Seal the registry before any entity traffic can run.
//!
//! # Invariants
//! - `ProvisionProfileHook` runs before `TouchProfileHook` for the same
//!   (Account, after-persist) key; the bootstrap order is the contract.

use crate::hooks::handlers::{
    CompletionTimestampHook, ProvisionProfileHook, TouchProfileHook,
};
use crate::hooks::registry::{HookRegistry, HookRegistryError, HookStage};
use crate::model::EntityKind;
use log::info;
use std::sync::Arc;

/// Builds the default sealed registry used by production writers.
///
/// # Errors
/// - Propagates registration errors; with the fixed built-in set this only
///   fails if a future edit introduces a duplicate.
pub fn build_default_registry() -> Result<HookRegistry, HookRegistryError> {
    let mut registry = HookRegistry::new();

    registry.register(
        EntityKind::Account,
        HookStage::AfterPersist,
        Arc::new(ProvisionProfileHook),
    )?;
    registry.register(
        EntityKind::Account,
        HookStage::AfterPersist,
        Arc::new(TouchProfileHook),
    )?;
    registry.register(
        EntityKind::LessonProgress,
        HookStage::BeforePersist,
        Arc::new(CompletionTimestampHook),
    )?;

    registry.seal();
    info!(
        "event=hooks_bootstrap module=hooks status=ok hooks={}",
        registry.len()
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::build_default_registry;
    use crate::hooks::registry::HookStage;
    use crate::model::EntityKind;

    #[test]
    fn default_registry_is_sealed_with_builtin_hooks() {
        let registry = build_default_registry().expect("default registry should build");
        assert!(registry.is_sealed());
        assert_eq!(
            registry.hook_count(EntityKind::Account, HookStage::AfterPersist),
            2
        );
        assert_eq!(
            registry.hook_count(EntityKind::LessonProgress, HookStage::BeforePersist),
            1
        );
        assert_eq!(registry.len(), 3);
    }
}
