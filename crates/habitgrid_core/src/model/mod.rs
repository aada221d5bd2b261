//! Domain model for habit tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the data they protect.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Deletion is represented by soft-delete flags, not hard delete.

pub mod completion;
pub mod date;
pub mod habit;
pub mod metadata;
