//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage and hook wiring details.

pub mod account_service;
pub mod progress_service;
