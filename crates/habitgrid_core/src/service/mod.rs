//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce the auth policy: query-style operations degrade to empty
//!   results for anonymous callers, mutation-style operations reject with
//!   `Unauthenticated`.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - Not-found and not-owned collapse into one error so existence of other
//!   users' records is never revealed.

pub mod completion_service;
pub mod habit_service;
