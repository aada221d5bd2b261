//! Habit use-case service.
//!
//! # Responsibility
//! - Provide auth-aware habit operations above the repository layer.
//! - Enforce the one-level nesting rule before writes.
//!
//! # Invariants
//! - A parent habit must exist, belong to the caller, be active, and be
//!   top-level.
//! - A habit that has sub-habits can never be given a parent.
//! - Deactivation cascades to direct children and is terminal via this API.

use crate::auth::AuthContext;
use crate::model::completion::HabitDayStatus;
use crate::model::date::DayDate;
use crate::model::habit::{Habit, HabitId, HabitValidationError, UserId};
use crate::model::metadata::MetadataField;
use crate::repo::habit_repo::{HabitListQuery, HabitRepoError, HabitRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from habit service operations.
#[derive(Debug)]
pub enum HabitServiceError {
    /// No signed-in caller for a mutation.
    Unauthenticated,
    /// Target habit does not exist for this caller (missing or foreign).
    HabitNotFound(HabitId),
    /// Requested parent does not exist for this caller, or is inactive.
    ParentNotFound(HabitId),
    /// Requested parent is itself nested; nesting is one level deep.
    ParentNotNestable(HabitId),
    /// Habit has sub-habits and therefore cannot be nested under a parent.
    HabitHasChildren(HabitId),
    /// Model-level validation failure.
    Validation(HabitValidationError),
    /// Repository-level failure.
    Repo(HabitRepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not authenticated"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent habit not found: {id}"),
            Self::ParentNotNestable(id) => {
                write!(f, "parent habit is itself nested: {id}")
            }
            Self::HabitHasChildren(id) => {
                write!(f, "habit has sub-habits and cannot be nested: {id}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitRepoError> for HabitServiceError {
    fn from(value: HabitRepoError) -> Self {
        match value {
            HabitRepoError::HabitNotFound(id) => Self::HabitNotFound(id),
            HabitRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Input for creating one habit.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateHabitRequest {
    pub name: String,
    pub color: String,
    pub icon: String,
    pub parent_uuid: Option<HabitId>,
    pub metadata: Option<Vec<MetadataField>>,
}

/// Input for a full-replacement habit update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateHabitRequest {
    pub habit_uuid: HabitId,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub parent_uuid: Option<HabitId>,
    pub metadata: Option<Vec<MetadataField>>,
}

/// Use-case service for habit operations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists the caller's active habits; top-level only unless
    /// `include_nested`. Anonymous callers get an empty list.
    pub fn list_habits(
        &self,
        auth: &AuthContext,
        include_nested: bool,
    ) -> Result<Vec<Habit>, HabitServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(Vec::new()),
        };
        self.repo
            .list_habits(owner, &HabitListQuery { include_nested })
            .map_err(Into::into)
    }

    /// Loads one habit by id. Missing, foreign, and anonymous lookups all
    /// yield `None` so record existence is never leaked.
    pub fn get_habit(
        &self,
        auth: &AuthContext,
        id: HabitId,
    ) -> Result<Option<Habit>, HabitServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(None),
        };
        self.repo.get_habit(owner, id).map_err(Into::into)
    }

    /// Lists active habits nested directly under `parent`.
    pub fn list_sub_habits(
        &self,
        auth: &AuthContext,
        parent: HabitId,
    ) -> Result<Vec<Habit>, HabitServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(Vec::new()),
        };
        self.repo.list_sub_habits(owner, parent).map_err(Into::into)
    }

    /// Pairs every active habit with its completion state on `date`.
    pub fn list_day_statuses(
        &self,
        auth: &AuthContext,
        date: &DayDate,
    ) -> Result<Vec<HabitDayStatus>, HabitServiceError> {
        let owner = match auth.user() {
            Some(owner) => owner,
            None => return Ok(Vec::new()),
        };
        self.repo.list_day_statuses(owner, date).map_err(Into::into)
    }

    /// Creates a new active habit owned by the caller and returns its id.
    pub fn create_habit(
        &self,
        auth: &AuthContext,
        request: CreateHabitRequest,
    ) -> Result<HabitId, HabitServiceError> {
        let owner = auth.user().ok_or(HabitServiceError::Unauthenticated)?;

        if let Some(parent_uuid) = request.parent_uuid {
            self.ensure_parent_accepts_children(owner, parent_uuid)?;
        }

        let mut habit = Habit::new(owner, request.name, request.color, request.icon);
        habit.parent_uuid = request.parent_uuid;
        habit.metadata = request.metadata;

        self.repo.create_habit(&habit).map_err(Into::into)
    }

    /// Replaces name/color/icon/parent/metadata of an owned habit.
    ///
    /// The `is_active` flag is deliberately untouched; deactivation has its
    /// own operation.
    pub fn update_habit(
        &self,
        auth: &AuthContext,
        request: UpdateHabitRequest,
    ) -> Result<(), HabitServiceError> {
        let owner = auth.user().ok_or(HabitServiceError::Unauthenticated)?;

        let current = self
            .repo
            .get_habit(owner, request.habit_uuid)?
            .ok_or(HabitServiceError::HabitNotFound(request.habit_uuid))?;

        if let Some(parent_uuid) = request.parent_uuid {
            if parent_uuid != request.habit_uuid {
                self.ensure_parent_accepts_children(owner, parent_uuid)?;
            }
            if !self.repo.list_sub_habits(owner, request.habit_uuid)?.is_empty() {
                return Err(HabitServiceError::HabitHasChildren(request.habit_uuid));
            }
        }

        let habit = Habit {
            uuid: request.habit_uuid,
            user_uuid: owner,
            name: request.name,
            color: request.color,
            icon: request.icon,
            is_active: current.is_active,
            parent_uuid: request.parent_uuid,
            metadata: request.metadata,
        };

        self.repo.update_habit(&habit).map_err(Into::into)
    }

    /// Deactivates an owned habit and all of its direct children.
    pub fn deactivate_habit(
        &self,
        auth: &AuthContext,
        id: HabitId,
    ) -> Result<(), HabitServiceError> {
        let owner = auth.user().ok_or(HabitServiceError::Unauthenticated)?;
        self.repo.deactivate_habit(owner, id).map_err(Into::into)
    }

    fn ensure_parent_accepts_children(
        &self,
        owner: UserId,
        parent_uuid: HabitId,
    ) -> Result<(), HabitServiceError> {
        let parent = self
            .repo
            .get_habit(owner, parent_uuid)?
            .filter(|parent| parent.is_active)
            .ok_or(HabitServiceError::ParentNotFound(parent_uuid))?;
        if !parent.is_top_level() {
            return Err(HabitServiceError::ParentNotNestable(parent_uuid));
        }
        Ok(())
    }
}
