//! Task-completion toggle command.
//!
//! # Responsibility
//! - Flip one task's completion flag and settle the owner's leveling state.
//! - Own the optimistic-update/rollback discipline around both writes.
//!
//! # Invariants
//! - The leveling engine runs only after the task write has committed.
//! - The new `(level, xp)` pair is computed from the pre-toggle snapshot
//!   held by the session, not from a re-read.
//! - The session adopts the stored user row echoed by the stats write;
//!   locally computed values never survive a successful commit.
//! - When the stats write fails after the task write succeeded, only the
//!   local flag reverts. The stored task row is left as written and the
//!   divergence is surfaced in the log, not repaired.

use crate::leveling::{LevelProgress, ToggleDirection};
use crate::model::task::{Task, TaskId};
use crate::model::user::User;
use crate::repo::task_repo::TaskRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Locally-held state for one signed-in user.
///
/// The presentation layer owns one of these per session and passes it to
/// every toggle call; there is no ambient current-user state in core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Last authoritative user record received from storage.
    pub user: User,
    /// Task list as currently displayed, newest first.
    pub tasks: Vec<Task>,
}

impl Session {
    pub fn new(user: User, tasks: Vec<Task>) -> Self {
        Self { user, tasks }
    }

    fn task_index(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

/// Failure of one toggle action. Every variant is terminal; there are no
/// retries.
#[derive(Debug)]
pub enum ToggleError {
    /// The task is not part of this session's list.
    TaskNotFound(TaskId),
    /// The completion-flag write failed; the local flip was rolled back and
    /// the leveling engine was never invoked.
    TaskPersist { task_id: TaskId, source: RepoError },
    /// The stats write failed after the task write succeeded; the local
    /// flip was rolled back but the stored task row kept its new value.
    StatsPersist { task_id: TaskId, source: RepoError },
}

impl Display for ToggleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not in session: {id}"),
            Self::TaskPersist { task_id, source } => {
                write!(f, "task update failed for {task_id}: {source}")
            }
            Self::StatsPersist { task_id, source } => {
                write!(f, "stats update failed after task update for {task_id}: {source}")
            }
        }
    }
}

impl Error for ToggleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TaskNotFound(_) => None,
            Self::TaskPersist { source, .. } => Some(source),
            Self::StatsPersist { source, .. } => Some(source),
        }
    }
}

/// Outcome summary of one successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleReceipt {
    pub task_id: TaskId,
    pub direction: ToggleDirection,
    /// Snapshot the transition was computed from.
    pub previous: LevelProgress,
    /// Pair handed to the stats write. The session user may differ when
    /// storage echoed something newer.
    pub computed: LevelProgress,
}

impl ToggleReceipt {
    /// Whether the computed transition crossed a level boundary.
    pub fn level_changed(&self) -> bool {
        self.previous.level != self.computed.level
    }
}

/// Toggle command over user and task repositories.
pub struct ToggleService<'repos, U: UserRepository, T: TaskRepository> {
    users: &'repos U,
    tasks: &'repos T,
}

impl<'repos, U: UserRepository, T: TaskRepository> ToggleService<'repos, U, T> {
    pub fn new(users: &'repos U, tasks: &'repos T) -> Self {
        Self { users, tasks }
    }

    /// Toggles one task and settles the owner's leveling state.
    ///
    /// # Contract
    /// - On `TaskPersist` errors the session is unchanged.
    /// - On `StatsPersist` errors the session is unchanged but the stored
    ///   task row keeps the new completion flag.
    /// - On success `session.user` is the stored row echoed by the stats
    ///   write and the task keeps its flipped flag.
    pub fn toggle_task(
        &self,
        session: &mut Session,
        task_id: TaskId,
    ) -> Result<ToggleReceipt, ToggleError> {
        let index = session
            .task_index(task_id)
            .ok_or(ToggleError::TaskNotFound(task_id))?;

        let was_completed = session.tasks[index].completed;
        let now_completed = !was_completed;

        // Optimistic flip so the presentation layer can repaint immediately.
        session.tasks[index].completed = now_completed;

        if let Err(source) = self.tasks.set_completed(task_id, now_completed) {
            session.tasks[index].completed = was_completed;
            warn!(
                "event=task_toggle module=service status=error task_id={task_id} error_code=task_persist_failed error={source}"
            );
            return Err(ToggleError::TaskPersist { task_id, source });
        }

        let direction = if now_completed {
            ToggleDirection::Gain
        } else {
            ToggleDirection::Lose
        };
        let previous = session.user.progress();
        let computed = previous.apply(direction);

        match self.users.update_stats(session.user.id, computed) {
            Ok(stored) => {
                info!(
                    "event=task_toggle module=service status=ok task_id={task_id} direction={} level={} xp={} level_changed={}",
                    direction.as_str(),
                    stored.level,
                    stored.xp,
                    previous.level != stored.level
                );
                session.user = stored;
                Ok(ToggleReceipt {
                    task_id,
                    direction,
                    previous,
                    computed,
                })
            }
            Err(source) => {
                // The completion flag already committed; reverting only the
                // local flip leaves client and storage divergent until the
                // next full reload.
                session.tasks[index].completed = was_completed;
                warn!(
                    "event=task_toggle module=service status=error task_id={task_id} direction={} error_code=stats_persist_failed error={source}",
                    direction.as_str()
                );
                Err(ToggleError::StatsPersist { task_id, source })
            }
        }
    }
}
