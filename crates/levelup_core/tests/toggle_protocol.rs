use levelup_core::db::{open_db_in_memory, DbError};
use levelup_core::{
    AccountService, LevelProgress, RegisterRequest, RepoError, RepoResult, Session,
    SqliteTaskRepository, SqliteUserRepository, StoredCredential, Task, TaskId, TaskRepository,
    ToggleDirection, ToggleError, ToggleService, User, UserId, UserRepository,
};
use rusqlite::Connection;
use std::cell::Cell;
use uuid::Uuid;

fn seeded_session(conn: &Connection, task_texts: &[&str]) -> Session {
    let accounts = AccountService::new(SqliteUserRepository::new(conn));
    let user = accounts
        .register(&RegisterRequest {
            username: "nova".to_string(),
            email: "nova@example.com".to_string(),
            password: "hunter2!".to_string(),
            confirm_password: "hunter2!".to_string(),
        })
        .unwrap();

    let tasks = SqliteTaskRepository::new(conn);
    for text in task_texts {
        tasks.create_task(&Task::new(user.id, *text)).unwrap();
    }
    let listed = tasks.list_tasks(user.id).unwrap();
    Session::new(user, listed)
}

/// Task repository double that can be told to fail its next write.
struct FlakyTaskRepo<'conn> {
    inner: SqliteTaskRepository<'conn>,
    fail_next_write: Cell<bool>,
}

impl<'conn> FlakyTaskRepo<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteTaskRepository::new(conn),
            fail_next_write: Cell::new(false),
        }
    }
}

impl TaskRepository for FlakyTaskRepo<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.inner.create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.inner.get_task(id)
    }

    fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<Task>> {
        self.inner.list_tasks(user_id)
    }

    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()> {
        if self.fail_next_write.replace(false) {
            return Err(RepoError::Db(DbError::Sqlite(
                rusqlite::Error::ExecuteReturnedResults,
            )));
        }
        self.inner.set_completed(id, completed)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.inner.delete_task(id)
    }
}

/// User repository double that can fail stats writes or echo foreign state.
struct FlakyUserRepo<'conn> {
    inner: SqliteUserRepository<'conn>,
    fail_next_stats_write: Cell<bool>,
    echo_override: Cell<Option<LevelProgress>>,
}

impl<'conn> FlakyUserRepo<'conn> {
    fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteUserRepository::new(conn),
            fail_next_stats_write: Cell::new(false),
            echo_override: Cell::new(None),
        }
    }
}

impl UserRepository for FlakyUserRepo<'_> {
    fn create_user(&self, user: &User, password_hash: &str) -> RepoResult<UserId> {
        self.inner.create_user(user, password_hash)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.inner.get_user(id)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.inner.find_user_by_email(email)
    }

    fn get_credential(&self, email: &str) -> RepoResult<Option<StoredCredential>> {
        self.inner.get_credential(email)
    }

    fn update_stats(&self, id: UserId, progress: LevelProgress) -> RepoResult<User> {
        if self.fail_next_stats_write.replace(false) {
            return Err(RepoError::Db(DbError::Sqlite(
                rusqlite::Error::ExecuteReturnedResults,
            )));
        }
        // Simulates a concurrent writer winning between compute and commit.
        let effective = self.echo_override.take().unwrap_or(progress);
        self.inner.update_stats(id, effective)
    }
}

#[test]
fn completing_a_task_grants_xp_and_persists_both_rows() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["water the plants"]);
    let task_id = session.tasks[0].id;

    let users = SqliteUserRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    let toggle = ToggleService::new(&users, &tasks);

    let receipt = toggle.toggle_task(&mut session, task_id).unwrap();
    assert_eq!(receipt.direction, ToggleDirection::Gain);
    assert_eq!(receipt.previous, LevelProgress::new(1, 0));
    assert_eq!(receipt.computed, LevelProgress::new(1, 10));
    assert!(!receipt.level_changed());

    // Session and storage agree on both fields.
    assert!(session.tasks[0].completed);
    assert_eq!(session.user.xp, 10);
    assert!(tasks.get_task(task_id).unwrap().unwrap().completed);
    assert_eq!(users.get_user(session.user.id).unwrap().unwrap().xp, 10);
}

#[test]
fn reopening_a_task_takes_the_xp_back() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["water the plants"]);
    let task_id = session.tasks[0].id;

    let users = SqliteUserRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    let toggle = ToggleService::new(&users, &tasks);

    toggle.toggle_task(&mut session, task_id).unwrap();
    let receipt = toggle.toggle_task(&mut session, task_id).unwrap();

    assert_eq!(receipt.direction, ToggleDirection::Lose);
    assert!(!session.tasks[0].completed);
    assert_eq!(session.user.level, 1);
    assert_eq!(session.user.xp, 0);
}

#[test]
fn crossing_the_threshold_levels_up_with_carry() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["the big one"]);
    let task_id = session.tasks[0].id;

    let users = SqliteUserRepository::new(&conn);
    users
        .update_stats(session.user.id, LevelProgress::new(1, 95))
        .unwrap();
    session.user.xp = 95;

    let tasks = SqliteTaskRepository::new(&conn);
    let toggle = ToggleService::new(&users, &tasks);

    let receipt = toggle.toggle_task(&mut session, task_id).unwrap();
    assert!(receipt.level_changed());
    assert_eq!(session.user.level, 2);
    assert_eq!(session.user.xp, 5);
}

#[test]
fn de_level_on_reopen_lands_below_the_previous_cap() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["already done"]);
    let task_id = session.tasks[0].id;

    let users = SqliteUserRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    tasks.set_completed(task_id, true).unwrap();
    session.tasks[0].completed = true;
    users
        .update_stats(session.user.id, LevelProgress::new(2, 5))
        .unwrap();
    session.user.level = 2;
    session.user.xp = 5;

    let toggle = ToggleService::new(&users, &tasks);
    toggle.toggle_task(&mut session, task_id).unwrap();

    assert_eq!(session.user.level, 1);
    assert_eq!(session.user.xp, 90);
}

#[test]
fn unknown_task_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["only one"]);

    let users = SqliteUserRepository::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    let toggle = ToggleService::new(&users, &tasks);

    let ghost = Uuid::new_v4();
    let before = session.clone();
    let err = toggle.toggle_task(&mut session, ghost).unwrap_err();
    assert!(matches!(err, ToggleError::TaskNotFound(id) if id == ghost));
    assert_eq!(session, before);
}

#[test]
fn task_persist_failure_rolls_back_and_skips_the_engine() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["fragile"]);
    let task_id = session.tasks[0].id;

    let users = SqliteUserRepository::new(&conn);
    let tasks = FlakyTaskRepo::new(&conn);
    tasks.fail_next_write.set(true);
    let toggle = ToggleService::new(&users, &tasks);

    let before = session.clone();
    let err = toggle.toggle_task(&mut session, task_id).unwrap_err();
    assert!(matches!(err, ToggleError::TaskPersist { task_id: id, .. } if id == task_id));

    // Local flip rolled back, no stats written, storage untouched.
    assert_eq!(session, before);
    assert!(!tasks.get_task(task_id).unwrap().unwrap().completed);
    assert_eq!(users.get_user(session.user.id).unwrap().unwrap().xp, 0);
}

#[test]
fn stats_persist_failure_leaves_the_documented_inconsistency_window() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["haunted"]);
    let task_id = session.tasks[0].id;

    let users = FlakyUserRepo::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    users.fail_next_stats_write.set(true);
    let toggle = ToggleService::new(&users, &tasks);

    let err = toggle.toggle_task(&mut session, task_id).unwrap_err();
    assert!(matches!(err, ToggleError::StatsPersist { task_id: id, .. } if id == task_id));

    // The session shows the pre-toggle world again...
    assert!(!session.tasks[0].completed);
    assert_eq!(session.user.xp, 0);
    // ...but the stored task row kept the new flag and no XP ever landed.
    assert!(tasks.get_task(task_id).unwrap().unwrap().completed);
    assert_eq!(users.get_user(session.user.id).unwrap().unwrap().xp, 0);
}

#[test]
fn session_adopts_the_echoed_row_over_the_computed_pair() {
    let conn = open_db_in_memory().unwrap();
    let mut session = seeded_session(&conn, &["raced"]);
    let task_id = session.tasks[0].id;

    let users = FlakyUserRepo::new(&conn);
    let tasks = SqliteTaskRepository::new(&conn);
    users.echo_override.set(Some(LevelProgress::new(3, 40)));
    let toggle = ToggleService::new(&users, &tasks);

    let receipt = toggle.toggle_task(&mut session, task_id).unwrap();

    // The computed pair said (1, 10), but storage answered with what it
    // actually holds; the session follows storage.
    assert_eq!(receipt.computed, LevelProgress::new(1, 10));
    assert_eq!(session.user.level, 3);
    assert_eq!(session.user.xp, 40);
}
