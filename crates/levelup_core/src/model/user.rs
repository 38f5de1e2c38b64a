//! User domain model.
//!
//! # Responsibility
//! - Define the user read model shared by services and repositories.
//! - Validate identity, email shape and settled leveling state.
//!
//! # Invariants
//! - `id` is stable and never reused for another account.
//! - The read model never carries credential material.
//! - A settled record satisfies `level >= 1` and `xp < level * 100`.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::leveling::{xp_threshold, LevelProgress};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a user account.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Validation failure for user records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Nil UUID is reserved and never a valid identity.
    NilUuid,
    /// Display name must not be empty.
    EmptyUsername,
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// `(level, xp)` is outside the settled-state envelope.
    StatsOutOfRange { level: u32, xp: u32 },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "user id must not be the nil uuid"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::StatsOutOfRange { level, xp } => {
                write!(f, "stats out of range: level={level} xp={xp}")
            }
        }
    }
}

impl Error for UserValidationError {}

/// Canonical user record exposed to services and the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable account ID used for task ownership and auditing.
    pub id: UserId,
    /// Display name shown by the presentation layer.
    pub username: String,
    /// Login email, normalized to lowercase before persistence.
    pub email: String,
    /// Current tier, starts at 1.
    pub level: u32,
    /// XP accumulated inside the current tier, starts at 0.
    pub xp: u32,
}

impl User {
    /// Creates a new account record with a generated stable ID.
    ///
    /// Fresh accounts always start at level 1 with zero XP.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            level: LevelProgress::START.level,
            xp: LevelProgress::START.xp,
        }
    }

    /// Creates a user record with a caller-provided stable ID.
    ///
    /// Used by read paths where identity already exists in storage.
    pub fn with_id(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        level: u32,
        xp: u32,
    ) -> Result<Self, UserValidationError> {
        let user = Self {
            id,
            username: username.into(),
            email: email.into(),
            level,
            xp,
        };
        user.validate()?;
        Ok(user)
    }

    /// Checks identity, email shape and the settled leveling envelope.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id.is_nil() {
            return Err(UserValidationError::NilUuid);
        }
        if self.username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        validate_progress(self.progress())?;
        Ok(())
    }

    /// Current `(level, xp)` pair as a leveling-engine value.
    pub fn progress(&self) -> LevelProgress {
        LevelProgress::new(self.level, self.xp)
    }
}

/// Checks that a `(level, xp)` pair is inside the settled-state envelope.
pub fn validate_progress(progress: LevelProgress) -> Result<(), UserValidationError> {
    if progress.level < 1 || progress.xp >= xp_threshold(progress.level) {
        return Err(UserValidationError::StatsOutOfRange {
            level: progress.level,
            xp: progress.xp,
        });
    }
    Ok(())
}
