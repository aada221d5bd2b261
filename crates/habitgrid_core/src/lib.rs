//! Core domain logic for HabitGrid.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::AuthContext;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::completion::{Completion, CompletionId, CompletionStats, HabitDayStatus};
pub use model::date::{DateError, DayDate};
pub use model::habit::{Habit, HabitId, HabitValidationError, UserId};
pub use model::metadata::{
    MetadataField, MetadataFieldError, MetadataKind, MetadataValue, MetadataValues,
};
pub use repo::completion_repo::{
    CompletionRepoError, CompletionRepoResult, CompletionRepository, SqliteCompletionRepository,
    ToggleRequest,
};
pub use repo::habit_repo::{
    HabitListQuery, HabitRepoError, HabitRepoResult, HabitRepository, SqliteHabitRepository,
};
pub use service::completion_service::{CompletionService, CompletionServiceError};
pub use service::habit_service::{
    CreateHabitRequest, HabitService, HabitServiceError, UpdateHabitRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
