//! Core domain logic for LevelUp.
//! This crate is the single source of truth for leveling invariants.

pub mod auth;
pub mod db;
pub mod leveling;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use leveling::{xp_threshold, LevelProgress, ToggleDirection, TASK_XP_REWARD};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use model::user::{User, UserId, UserValidationError};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, StoredCredential, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountService, AccountServiceError, RegisterRequest};
pub use service::task_service::TaskService;
pub use service::toggle::{Session, ToggleError, ToggleReceipt, ToggleService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
