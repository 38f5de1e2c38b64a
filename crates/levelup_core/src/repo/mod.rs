//! Persistence contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `users` and `tasks` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate domain records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - The task write and the stats write stay separate calls; nothing here
//!   wraps them in a shared transaction.

use crate::db::DbError;
use crate::model::task::{TaskId, TaskValidationError};
use crate::model::user::{UserId, UserValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by user and task persistence.
#[derive(Debug)]
pub enum RepoError {
    UserValidation(UserValidationError),
    TaskValidation(TaskValidationError),
    Db(DbError),
    UserNotFound(UserId),
    TaskNotFound(TaskId),
    EmailTaken(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::TaskValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::EmailTaken(email) => write!(f, "email already in use: `{email}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UserValidation(err) => Some(err),
            Self::TaskValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::TaskValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
