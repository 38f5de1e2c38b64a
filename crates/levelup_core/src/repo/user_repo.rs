//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist accounts and their credential hashes.
//! - Serve the authoritative stats update used by the toggle command.
//!
//! # Invariants
//! - The user read model never leaves this module with credential material.
//! - `update_stats` re-reads and returns the stored row, so callers always
//!   receive what the database holds rather than what they computed.
//! - Email uniqueness is case-insensitive.

use crate::leveling::LevelProgress;
use crate::model::user::{validate_progress, User, UserId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    level,
    xp
FROM users";

/// Credential lookup result for the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Account the credential belongs to.
    pub user_id: UserId,
    /// Salted hash in `salt$digest` form; opaque to callers.
    pub password_hash: String,
}

/// Repository interface for account persistence.
pub trait UserRepository {
    /// Creates one account row with its credential hash.
    fn create_user(&self, user: &User, password_hash: &str) -> RepoResult<UserId>;
    /// Gets one account by stable ID.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Gets one account by login email (case-insensitive).
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Gets the stored credential for a login email (case-insensitive).
    fn get_credential(&self, email: &str) -> RepoResult<Option<StoredCredential>>;
    /// Writes a settled `(level, xp)` pair and returns the stored row.
    fn update_stats(&self, id: UserId, progress: LevelProgress) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User, password_hash: &str) -> RepoResult<UserId> {
        user.validate()?;

        let taken: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1);",
            [user.email.as_str()],
            |row| row.get(0),
        )?;
        if taken {
            return Err(RepoError::EmailTaken(user.email.clone()));
        }

        self.conn.execute(
            "INSERT INTO users (id, username, email, password_hash, level, xp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                password_hash,
                user.level,
                user.xp,
            ],
        )?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;

        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn get_credential(&self, email: &str) -> RepoResult<Option<StoredCredential>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, password_hash FROM users WHERE email = ?1;")?;

        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let user_id = parse_user_id(&id_text)?;
            return Ok(Some(StoredCredential {
                user_id,
                password_hash: row.get("password_hash")?,
            }));
        }

        Ok(None)
    }

    fn update_stats(&self, id: UserId, progress: LevelProgress) -> RepoResult<User> {
        validate_progress(progress)?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                level = ?1,
                xp = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![progress.level, progress.xp, id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        // Echo the stored row so the caller adopts database truth.
        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = parse_user_id(&id_text)?;

    let level: i64 = row.get("level")?;
    let xp: i64 = row.get("xp")?;
    let level = u32::try_from(level).map_err(|_| {
        RepoError::InvalidData(format!("invalid level value `{level}` in users.level"))
    })?;
    let xp = u32::try_from(xp)
        .map_err(|_| RepoError::InvalidData(format!("invalid xp value `{xp}` in users.xp")))?;

    let user = User {
        id,
        username: row.get("username")?,
        email: row.get("email")?,
        level,
        xp,
    };
    user.validate()?;
    Ok(user)
}

fn parse_user_id(value: &str) -> RepoResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in users.id")))
}
