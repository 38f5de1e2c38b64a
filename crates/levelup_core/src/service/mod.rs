//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep presentation layers decoupled from storage details.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - The toggle command is the only writer of `(level, xp)` pairs.

pub mod account_service;
pub mod task_service;
pub mod toggle;
