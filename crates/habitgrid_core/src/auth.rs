//! Caller identity handed in by the external auth collaborator.
//!
//! # Responsibility
//! - Carry the authenticated user id (or its absence) into the service
//!   layer.
//!
//! # Invariants
//! - Core never mints user ids; they come from the auth provider.
//! - An anonymous context makes every query return empty results and every
//!   mutation fail, so existence of other users' data is never revealed.

use crate::model::habit::UserId;

/// Per-call authentication context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    user_uuid: Option<UserId>,
}

impl AuthContext {
    /// Context for a signed-in user.
    pub fn authenticated(user_uuid: UserId) -> Self {
        Self {
            user_uuid: Some(user_uuid),
        }
    }

    /// Context for a caller with no valid identity.
    pub fn anonymous() -> Self {
        Self { user_uuid: None }
    }

    /// Returns the caller's user id, if signed in.
    pub fn user(&self) -> Option<UserId> {
        self.user_uuid
    }
}
