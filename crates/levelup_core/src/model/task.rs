//! Task domain model.
//!
//! # Responsibility
//! - Define the to-do record owned by exactly one user.
//! - Provide lifecycle helpers for the completion flag.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `completed` is flipped only by the toggle command, in lockstep with
//!   the owner's leveling update.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a task row.
pub type TaskId = Uuid;

/// Validation failure for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Nil UUID is reserved and never a valid identity.
    NilUuid,
    /// A task must reference an owning user.
    NilOwner,
    /// Task text must not be empty.
    EmptyText,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "task id must not be the nil uuid"),
            Self::NilOwner => write!(f, "task owner must not be the nil uuid"),
            Self::EmptyText => write!(f, "task text must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable task ID.
    pub id: TaskId,
    /// Owning account; tasks are never shared between users.
    pub user_id: UserId,
    /// Free-form description entered by the user.
    pub text: String,
    /// Completion flag, starts `false`.
    pub completed: bool,
    /// Creation timestamp in epoch milliseconds. Lists sort newest first.
    pub created_at: i64,
}

impl Task {
    /// Creates a new incomplete task with a generated stable ID.
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, text, now_epoch_ms())
    }

    /// Creates a task record with caller-provided identity and timestamp.
    ///
    /// Used by read paths where the row already exists in storage.
    pub fn with_id(id: TaskId, user_id: UserId, text: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            user_id,
            text: text.into(),
            completed: false,
            created_at,
        }
    }

    /// Checks identity and text constraints.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilUuid);
        }
        if self.user_id.is_nil() {
            return Err(TaskValidationError::NilOwner);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
