//! Invalidation event payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A committed change that makes cached authorization facts stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvalidationEvent {
    /// A user's role or status changed.
    UserChanged {
        /// The user ID.
        user_id: UserId,
    },
    /// A user was deleted.
    UserDeleted {
        /// The user ID.
        user_id: UserId,
    },
    /// The permission set granted to a role changed.
    RoleChanged {
        /// The role name.
        role: String,
    },
}

impl InvalidationEvent {
    /// The tag handlers are registered against.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserChanged { .. } => EventKind::UserChanged,
            Self::UserDeleted { .. } => EventKind::UserDeleted,
            Self::RoleChanged { .. } => EventKind::RoleChanged,
        }
    }
}

/// Tag of an [`InvalidationEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// See [`InvalidationEvent::UserChanged`].
    UserChanged,
    /// See [`InvalidationEvent::UserDeleted`].
    UserDeleted,
    /// See [`InvalidationEvent::RoleChanged`].
    RoleChanged,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserChanged => write!(f, "user_changed"),
            Self::UserDeleted => write!(f, "user_deleted"),
            Self::RoleChanged => write!(f, "role_changed"),
        }
    }
}
