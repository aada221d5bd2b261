//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record owned by exactly one user.
//! - Provide lifecycle helpers for soft deactivation.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another habit.
//! - `is_active` is the source of truth for soft-delete state; rows are
//!   never hard-deleted so completion history stays intact.
//! - Nesting is one level deep: a habit carrying `parent_uuid` is never a
//!   parent itself (enforced by the service layer before writes).

use crate::model::metadata::{MetadataField, MetadataFieldError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier for a habit.
pub type HabitId = Uuid;

/// Identifier of the owning user, issued by the external auth collaborator.
pub type UserId = Uuid;

/// Validation failure for a habit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    /// Name is blank after trim.
    BlankName,
    /// A habit cannot be nested under itself.
    SelfParent,
    /// Two metadata fields share one name.
    DuplicateMetadataField(String),
    /// One metadata field declaration is invalid.
    Metadata(MetadataFieldError),
}

impl std::fmt::Display for HabitValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "habit name must not be blank"),
            Self::SelfParent => write!(f, "habit cannot be its own parent"),
            Self::DuplicateMetadataField(name) => {
                write!(f, "duplicate metadata field name `{name}`")
            }
            Self::Metadata(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for HabitValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MetadataFieldError> for HabitValidationError {
    fn from(value: MetadataFieldError) -> Self {
        Self::Metadata(value)
    }
}

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Stable global ID used for nesting and completion references.
    pub uuid: HabitId,
    /// Owning user; every read and write is scoped to this value.
    pub user_uuid: UserId,
    /// User-facing name. Must not be blank.
    pub name: String,
    /// Display color, typically a hex code. Not interpreted by core.
    pub color: String,
    /// Display icon identifier. Not interpreted by core.
    pub icon: String,
    /// Soft-delete flag; deactivation is terminal via the public contract.
    pub is_active: bool,
    /// Optional parent habit for one-level nesting.
    pub parent_uuid: Option<HabitId>,
    /// Ordered metadata field declarations collected at completion time.
    pub metadata: Option<Vec<MetadataField>>,
}

impl Habit {
    /// Creates a new active habit with a generated stable ID.
    pub fn new(
        user_uuid: UserId,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), user_uuid, name, color, icon)
    }

    /// Creates a new active habit with a caller-provided stable ID.
    pub fn with_id(
        uuid: HabitId,
        user_uuid: UserId,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            user_uuid,
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            is_active: true,
            parent_uuid: None,
            metadata: None,
        }
    }

    /// Marks this habit as deactivated.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Returns whether this habit sits at the top of the hierarchy.
    pub fn is_top_level(&self) -> bool {
        self.parent_uuid.is_none()
    }

    /// Checks structural validity before persistence.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::BlankName);
        }
        if self.parent_uuid == Some(self.uuid) {
            return Err(HabitValidationError::SelfParent);
        }

        if let Some(fields) = &self.metadata {
            let mut seen = HashSet::new();
            for field in fields {
                field.validate()?;
                if !seen.insert(field.name.trim().to_string()) {
                    return Err(HabitValidationError::DuplicateMetadataField(
                        field.name.trim().to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
