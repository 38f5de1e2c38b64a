//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-user to-do rows.
//! - Serve the completion-flag write used by the toggle command.
//!
//! # Invariants
//! - Task lists are always sorted by `created_at DESC, id ASC`.
//! - Deletion is a hard delete; removing a task never compensates the
//!   owner's leveling state.

use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    text,
    completed,
    created_at
FROM tasks";

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Creates one task row and returns its stable ID.
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Gets one task by stable ID.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists one user's tasks, newest first.
    fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<Task>>;
    /// Writes the completion flag of one task.
    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()>;
    /// Hard-deletes one task row.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (id, user_id, text, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.id.to_string(),
                task.user_id.to_string(),
                task.text.as_str(),
                bool_to_int(task.completed),
                task.created_at,
            ],
        )?;

        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([user_id.to_string()])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                completed = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![bool_to_int(completed), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let owner_text: String = row.get("user_id")?;
    let user_id = Uuid::parse_str(&owner_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{owner_text}` in tasks.user_id"))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let task = Task {
        id,
        user_id,
        text: row.get("text")?,
        completed,
        created_at: row.get("created_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
