//! Registration and login against the credential store.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::validation::{validate_password, ValidationError};
use crate::db::{CredentialId, CredentialStore, NewCredential, Role};
use crate::AppError;

/// Public text for every credential mismatch.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Input rejected by the username/password policy.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username already taken.
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    /// No record for this username.
    #[error("username '{0}' not found")]
    UsernameNotFound(String),

    /// Record exists but the password does not match.
    #[error("incorrect password for '{0}'")]
    IncorrectPassword(String),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// The credential store could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AuthError {
    /// Returns true for the two login failures that must look identical to
    /// the end user.
    pub fn is_credential_mismatch(&self) -> bool {
        matches!(
            self,
            AuthError::UsernameNotFound(_) | AuthError::IncorrectPassword(_)
        )
    }

    /// Message safe to show to the end user.
    ///
    /// Credential mismatches collapse into one generic text so the reply
    /// cannot be used to enumerate usernames.
    pub fn public_message(&self) -> String {
        match self {
            e if e.is_credential_mismatch() => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AuthError::StorageUnavailable(_) => {
                "service temporarily unavailable, please try again later".to_string()
            }
            AuthError::Password(_) => "internal error while processing password".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AppError> for AuthError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::DuplicateUsername(name) => AuthError::DuplicateUsername(name),
            AppError::NotFound(what) => AuthError::UsernameNotFound(what),
            other => AuthError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Register, login and password change over a [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: SqlitePool,
    hasher: PasswordHasher,
}

impl AuthService {
    /// Create a service over a connection pool.
    pub fn new(pool: SqlitePool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    /// Store handle for this service's pool.
    pub fn store(&self) -> CredentialStore<'_> {
        CredentialStore::new(&self.pool)
    }

    /// Hasher used for new credentials.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Register a new account.
    ///
    /// Policy validation is the caller's job; this only hashes and inserts.
    /// The insert is a single statement, so either the full record exists
    /// afterwards or nothing was written. Uniqueness is decided by the
    /// storage constraint.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<CredentialId, AuthError> {
        let password_hash = self.hasher.hash(password)?;
        let record = NewCredential::new(username, password_hash).with_role(role);

        match self.store().create(&record).await {
            Ok(id) => {
                info!(username = %username, user_id = id, role = %role, "New user registered");
                Ok(id)
            }
            Err(AppError::DuplicateUsername(name)) => {
                warn!(username = %name, "Registration rejected: username already exists");
                Err(AuthError::DuplicateUsername(name))
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Registration failed: storage error");
                Err(e.into())
            }
        }
    }

    /// Check a username/password pair and return the stored role.
    ///
    /// Never writes to the store.
    pub async fn login(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        let record = self.store().find_by_username(username).await.map_err(|e| {
            warn!(username = %username, error = %e, "Login failed: storage error");
            AuthError::from(e)
        })?;

        let Some(record) = record else {
            warn!(username = %username, cause = "username not found", "Login failed");
            return Err(AuthError::UsernameNotFound(username.to_string()));
        };

        if !self.hasher.verify(password, &record.password_hash) {
            warn!(username = %username, cause = "incorrect password", "Login failed");
            return Err(AuthError::IncorrectPassword(username.to_string()));
        }

        info!(username = %username, role = %record.role, "User logged in");
        Ok(record.role)
    }

    /// Replace a user's password after verifying the current one.
    ///
    /// The new password must pass the password policy. Confirmation of the
    /// new password is left to the caller.
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.login(username, current_password).await?;
        validate_password(new_password)?;

        let new_hash = self.hasher.hash(new_password)?;
        self.store()
            .update_password_hash(username, &new_hash)
            .await
            .map_err(AuthError::from)?;

        info!(username = %username, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::Database;

    async fn setup() -> (Database, AuthService) {
        let db = Database::open_in_memory().await.unwrap();
        let hasher = PasswordHasher::new(&HashingConfig::low_cost()).unwrap();
        let service = AuthService::new(db.pool().clone(), hasher);
        (db, service)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_db, service) = setup().await;

        let id = service
            .register("alice123", "Str0ngP@ss!", Role::Analyst)
            .await
            .unwrap();
        assert!(id > 0);

        let role = service.login("alice123", "Str0ngP@ss!").await.unwrap();
        assert_eq!(role, Role::Analyst);
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let record = service
            .store()
            .find_by_username("alice123")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(record.password_hash, "Str0ngP@ss!");
        assert!(record.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let result = service
            .register("alice123", "different1", Role::Admin)
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateUsername(ref n)) if n == "alice123"));

        // Nothing about the first record changed
        let role = service.login("alice123", "Str0ngP@ss!").await.unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(service.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (_db, service) = setup().await;

        let err = service.login("ghost", "whatever1").await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameNotFound(_)));
        assert!(err.is_credential_mismatch());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let err = service.login("alice123", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword(_)));
        assert!(err.is_credential_mismatch());
    }

    #[tokio::test]
    async fn test_mismatch_messages_are_indistinguishable() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let not_found = service.login("ghost", "Str0ngP@ss!").await.unwrap_err();
        let wrong = service.login("alice123", "wrong").await.unwrap_err();

        assert_eq!(not_found.public_message(), wrong.public_message());
        assert_eq!(wrong.public_message(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[tokio::test]
    async fn test_login_does_not_mutate_store() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();
        let before = service
            .store()
            .find_by_username("alice123")
            .await
            .unwrap()
            .unwrap();

        let _ = service.login("alice123", "wrong").await;
        service.login("alice123", "Str0ngP@ss!").await.unwrap();

        let after = service
            .store()
            .find_by_username("alice123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.password_hash, after.password_hash);
    }

    #[tokio::test]
    async fn test_login_storage_unavailable() {
        let (db, service) = setup().await;
        db.close().await;

        let err = service.login("alice123", "Str0ngP@ss!").await.unwrap_err();
        assert!(matches!(err, AuthError::StorageUnavailable(_)));
        assert!(!err.is_credential_mismatch());
    }

    #[tokio::test]
    async fn test_change_password() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        service
            .change_password("alice123", "Str0ngP@ss!", "N3wer#Pass")
            .await
            .unwrap();

        assert!(service.login("alice123", "Str0ngP@ss!").await.is_err());
        assert!(service.login("alice123", "N3wer#Pass").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let err = service
            .change_password("alice123", "nope", "N3wer#Pass")
            .await
            .unwrap_err();
        assert!(err.is_credential_mismatch());
        assert!(service.login("alice123", "Str0ngP@ss!").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_rejects_invalid_new_password() {
        let (_db, service) = setup().await;
        service
            .register("alice123", "Str0ngP@ss!", Role::User)
            .await
            .unwrap();

        let err = service
            .change_password("alice123", "Str0ngP@ss!", "short")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::PasswordTooShort)
        ));
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AuthError = AppError::DuplicateUsername("bobby".to_string()).into();
        assert!(matches!(err, AuthError::DuplicateUsername(_)));

        let err: AuthError = AppError::Database("disk I/O error".to_string()).into();
        assert!(matches!(err, AuthError::StorageUnavailable(_)));
    }

    #[test]
    fn test_public_message_for_duplicate() {
        let err = AuthError::DuplicateUsername("alice123".to_string());
        assert_eq!(err.public_message(), "username 'alice123' already exists");
    }
}
