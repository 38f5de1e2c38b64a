//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/list/delete entry points for task rows.
//!
//! # Invariants
//! - Task creation returns the stored record, new ID included.
//! - Deleting a task never touches the owner's leveling state.
//! - Completion flags are not written here; that belongs to the toggle
//!   command.

use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use log::info;

/// Task service facade over a task repository.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new incomplete task for one user and returns it.
    pub fn create_task(&self, user_id: UserId, text: impl Into<String>) -> RepoResult<Task> {
        let task = Task::new(user_id, text);
        let id = self.repo.create_task(&task)?;
        info!("event=task_create module=service status=ok task_id={id} user_id={user_id}");
        Ok(task)
    }

    /// Lists one user's tasks, newest first.
    pub fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(user_id)
    }

    /// Hard-deletes one task by ID.
    ///
    /// Returns `RepoError::TaskNotFound` when no row was removed.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }
}
