//! Salted password hashing and verification.
//!
//! # Responsibility
//! - Derive storable hashes from plaintext passwords.
//! - Verify login attempts against stored hashes.
//!
//! # Invariants
//! - Every hash carries its own random salt; equal passwords produce
//!   different stored values.
//! - Digest comparison is constant-time.
//! - A malformed stored value never verifies.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SALT_LEN: usize = 16;
const DIGEST_ROUNDS: u32 = 64_000;
const FIELD_SEPARATOR: char = '$';

/// Failure while deriving a new password hash.
#[derive(Debug)]
pub enum PasswordHashError {
    /// The platform entropy source failed.
    Entropy(getrandom::Error),
}

impl Display for PasswordHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entropy(err) => write!(f, "failed to gather salt entropy: {err}"),
        }
    }
}

impl Error for PasswordHashError {}

/// Derives a storable `salt$digest` value from a plaintext password.
///
/// # Errors
/// - Returns an error when the platform entropy source fails.
pub fn hash_password(plain: &str) -> Result<String, PasswordHashError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt).map_err(PasswordHashError::Entropy)?;

    let digest = derive_digest(&salt, plain);
    Ok(format!(
        "{}{FIELD_SEPARATOR}{}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    ))
}

/// Verifies a plaintext password against a stored `salt$digest` value.
///
/// Returns `false` for wrong passwords and for malformed stored values;
/// callers treat both as invalid credentials.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once(FIELD_SEPARATOR) else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(digest_b64) else {
        return false;
    };

    let actual = derive_digest(&salt, plain);
    constant_time_eq(&actual, &expected)
}

fn derive_digest(salt: &[u8], plain: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(plain.as_bytes());
    let mut digest: [u8; 32] = hasher.finalize().into();

    // The salt is folded into every round, not just the first.
    for _ in 1..DIGEST_ROUNDS {
        let mut round = Sha256::new();
        round.update(salt);
        round.update(digest);
        digest = round.finalize().into();
    }

    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        diff |= lhs ^ rhs;
    }
    diff == 0
}
