//! Entity lifecycle hook system.
//!
//! # Responsibility
//! - Map (entity kind, lifecycle stage) to an ordered list of handlers.
//! - Run handlers synchronously inside the write path so invariants hold
//!   without every call site remembering to enforce them.
//!
//! # Invariants
//! - The registry is populated during bootstrap and sealed before any
//!   entity traffic; registration after sealing is a configuration error.
//! - Handlers for one key run in registration order; the first failure
//!   aborts the remaining handlers and the surrounding write.
//!
//! # See also
//! - docs/architecture/lifecycle-hooks.md

pub mod bootstrap;
pub mod handlers;
pub mod registry;
