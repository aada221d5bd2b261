//! Completion domain model.
//!
//! # Invariants
//! - At most one completion exists per `(user_uuid, habit_uuid, date)`.
//! - Completions are created lazily on first toggle and mutated in place
//!   afterwards; no operation deletes them.

use crate::model::date::DayDate;
use crate::model::habit::{HabitId, UserId};
use crate::model::metadata::MetadataValues;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a completion row.
pub type CompletionId = Uuid;

/// Per-day completion record for one habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Stable row ID.
    pub uuid: CompletionId,
    /// Owning user.
    pub user_uuid: UserId,
    /// Habit this completion belongs to.
    pub habit_uuid: HabitId,
    /// Calendar day the completion applies to.
    pub date: DayDate,
    /// Whether the habit was done on `date`.
    pub completed: bool,
    /// Collected metadata values keyed by field name.
    pub metadata: Option<MetadataValues>,
}

/// Aggregate completion counts over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    /// Completion rows in range, completed or not.
    pub total: u64,
    /// Rows in range with `completed = true`.
    pub completed: u64,
    /// `completed / total` rounded to the nearest integer percent; 0 when
    /// `total` is 0.
    pub percentage: u8,
}

impl CompletionStats {
    /// Builds stats from raw counts, guarding the empty-range case.
    pub fn from_counts(total: u64, completed: u64) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            completed,
            percentage,
        }
    }

    /// Stats for an empty result set.
    pub fn empty() -> Self {
        Self {
            total: 0,
            completed: 0,
            percentage: 0,
        }
    }
}

/// Read model pairing a habit with its completion state on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDayStatus {
    /// The active habit.
    pub habit_uuid: HabitId,
    /// Habit name, denormalized for day views.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
    /// Parent habit, when nested.
    pub parent_uuid: Option<HabitId>,
    /// Completion flag for the requested day; `false` when no row exists.
    pub completed: bool,
}
