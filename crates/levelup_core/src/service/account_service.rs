//! Account use-case service.
//!
//! # Responsibility
//! - Register new accounts with hashed credentials.
//! - Authenticate login attempts.
//!
//! # Invariants
//! - Emails are trimmed and lowercased before any lookup or insert.
//! - Login failures collapse into one generic error; callers cannot tell
//!   an unknown email from a wrong password.
//! - Plaintext passwords are never logged or persisted.

use crate::auth::password::{hash_password, verify_password, PasswordHashError};
use crate::model::user::User;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registration input as received from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// A required field is empty.
    MissingField(&'static str),
    /// Password and confirmation differ.
    PasswordMismatch,
    /// Email fails the shape check.
    InvalidEmail(String),
    /// Email is already registered.
    EmailTaken(String),
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// Credential hashing failed.
    Hash(PasswordHashError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmailTaken(email) => write!(f, "email already in use: `{email}`"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Hash(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PasswordHashError> for AccountServiceError {
    fn from(value: PasswordHashError) -> Self {
        Self::Hash(value)
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::EmailTaken(email) => Self::EmailTaken(email),
            other => Self::Repo(other),
        }
    }
}

/// Account service facade over a user repository.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account and returns its level-1 user record.
    ///
    /// # Contract
    /// - All four fields are required.
    /// - `password` must equal `confirm_password`.
    /// - The email must not already be registered.
    pub fn register(&self, request: &RegisterRequest) -> Result<User, AccountServiceError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(AccountServiceError::MissingField("username"));
        }
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AccountServiceError::MissingField("email"));
        }
        if request.password.is_empty() {
            return Err(AccountServiceError::MissingField("password"));
        }
        if request.confirm_password.is_empty() {
            return Err(AccountServiceError::MissingField("confirm_password"));
        }
        if request.password != request.confirm_password {
            return Err(AccountServiceError::PasswordMismatch);
        }

        let user = User::new(username, email);
        if user.validate().is_err() {
            // The error detail would carry the address; log the code only.
            warn!("event=account_register module=service status=error error_code=invalid_email");
            return Err(AccountServiceError::InvalidEmail(user.email));
        }

        // Duplicate emails are rejected before any hash work; the repository
        // enforces uniqueness again at insert time.
        if self.repo.find_user_by_email(&user.email)?.is_some() {
            warn!("event=account_register module=service status=error error_code=email_taken");
            return Err(AccountServiceError::EmailTaken(user.email));
        }

        let password_hash = hash_password(&request.password)?;
        match self.repo.create_user(&user, &password_hash) {
            Ok(id) => {
                info!(
                    "event=account_register module=service status=ok user_id={id} level={} xp={}",
                    user.level, user.xp
                );
                Ok(user)
            }
            Err(err) => {
                let error_code = match &err {
                    RepoError::EmailTaken(_) => "email_taken",
                    _ => "create_failed",
                };
                warn!("event=account_register module=service status=error error_code={error_code}");
                Err(err.into())
            }
        }
    }

    /// Authenticates a login attempt and returns the account record.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AccountServiceError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AccountServiceError::MissingField("email or password"));
        }

        let Some(credential) = self.repo.get_credential(&email)? else {
            info!("event=account_login module=service status=error error_code=invalid_credentials");
            return Err(AccountServiceError::InvalidCredentials);
        };

        if !verify_password(password, &credential.password_hash) {
            info!("event=account_login module=service status=error error_code=invalid_credentials");
            return Err(AccountServiceError::InvalidCredentials);
        }

        let user = self
            .repo
            .get_user(credential.user_id)?
            .ok_or(AccountServiceError::InvalidCredentials)?;

        info!(
            "event=account_login module=service status=ok user_id={} level={} xp={}",
            user.id, user.level, user.xp
        );
        Ok(user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
