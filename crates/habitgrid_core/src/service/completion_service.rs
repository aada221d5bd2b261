//! Completion use-case service.
//!
//! # Responsibility
//! - Provide auth-aware completion queries, the toggle mutation, and range
//!   statistics.
//!
//! # Invariants
//! - Queries return empty results for anonymous callers; only the toggle
//!   mutation rejects with `Unauthenticated`.
//! - An empty habit-id filter means "no filter".

use crate::auth::AuthContext;
use crate::model::completion::{Completion, CompletionStats};
use crate::model::date::DayDate;
use crate::model::habit::HabitId;
use crate::repo::completion_repo::{
    CompletionRepoError, CompletionRepository, ToggleRequest,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from completion service operations.
#[derive(Debug)]
pub enum CompletionServiceError {
    /// No signed-in caller for a mutation.
    Unauthenticated,
    /// Repository-level failure.
    Repo(CompletionRepoError),
}

impl Display for CompletionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not authenticated"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CompletionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Unauthenticated => None,
        }
    }
}

impl From<CompletionRepoError> for CompletionServiceError {
    fn from(value: CompletionRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service for completion operations.
pub struct CompletionService<R: CompletionRepository> {
    repo: R,
}

impl<R: CompletionRepository> CompletionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists the caller's completions with `date` in `[start, end]`
    /// inclusive, optionally narrowed to `habit_ids`. No implicit
    /// completed-only filter is applied.
    pub fn list_completions(
        &self,
        auth: &AuthContext,
        start: &DayDate,
        end: &DayDate,
        habit_ids: &[HabitId],
    ) -> Result<Vec<Completion>, CompletionServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(Vec::new()),
        };
        self.repo
            .list_range(owner, start, end, habit_ids)
            .map_err(Into::into)
    }

    /// Lists all of the caller's completions on one day.
    pub fn list_for_date(
        &self,
        auth: &AuthContext,
        date: &DayDate,
    ) -> Result<Vec<Completion>, CompletionServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(Vec::new()),
        };
        self.repo.list_for_date(owner, date).map_err(Into::into)
    }

    /// Creates or mutates the completion for `(caller, habit, date)`.
    ///
    /// Without an explicit `completed` value, an existing row flips and a
    /// missing row is created as complete; with an explicit value the call
    /// is idempotent. Metadata is replaced only when provided.
    pub fn toggle(
        &self,
        auth: &AuthContext,
        request: &ToggleRequest,
    ) -> Result<Completion, CompletionServiceError> {
        let owner = auth
            .user()
            .ok_or(CompletionServiceError::Unauthenticated)?;
        self.repo.toggle(owner, request).map_err(Into::into)
    }

    /// Aggregates completion counts over an inclusive date range, optionally
    /// narrowed to one habit. Anonymous callers get zeroed stats.
    pub fn stats(
        &self,
        auth: &AuthContext,
        start: &DayDate,
        end: &DayDate,
        habit_id: Option<HabitId>,
    ) -> Result<CompletionStats, CompletionServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(CompletionStats::empty()),
        };
        self.repo
            .stats(owner, start, end, habit_id)
            .map_err(Into::into)
    }
}
