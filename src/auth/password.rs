//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings. Records imported from the legacy
//! flat file carry bcrypt strings, which are still accepted by `verify`.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;
use thiserror::Error;

use crate::config::HashingConfig;

/// Password-hashing errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// The configured cost parameters were rejected.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),
}

/// Prefixes of the bcrypt modular-crypt variants.
const BCRYPT_PREFIXES: &[&str] = &["$2a$", "$2b$", "$2y$"];

/// Returns true if `hash` is a bcrypt string.
pub fn is_bcrypt_hash(hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p))
}

/// Salted adaptive password hasher.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters.
    pub fn new(config: &HashingConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Returns a PHC-formatted string that embeds the salt and parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashguard::auth::PasswordHasher;
    /// use dashguard::config::HashingConfig;
    ///
    /// let hasher = PasswordHasher::new(&HashingConfig::low_cost()).unwrap();
    /// let hash = hasher.hash("Str0ngP@ss!").unwrap();
    /// assert!(hash.starts_with("$argon2id$"));
    /// assert!(hasher.verify("Str0ngP@ss!", &hash));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// Malformed or unrecognized hashes verify as `false`.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        if is_bcrypt_hash(stored_hash) {
            return bcrypt::verify(password, stored_hash).unwrap_or(false);
        }

        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        // Parameters come from the parsed hash, not from self.params
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
