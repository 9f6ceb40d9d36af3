//! Credential store.
//!
//! Owns the mapping from username to stored credential record.

use sqlx::SqlitePool;

use super::user::{Credential, CredentialId, NewCredential};
use crate::{AppError, Result};

const SELECT_COLUMNS: &str = "SELECT id, username, password_hash, role, created_at FROM users";

/// Repository for credential records.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CredentialStore<'a> {
    /// Create a new CredentialStore with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new credential record.
    ///
    /// Uniqueness is enforced by the `users.username` constraint, so two
    /// concurrent inserts of the same name cannot both succeed. The loser gets
    /// [`AppError::DuplicateUsername`].
    pub async fn create(&self, record: &NewCredential) -> Result<CredentialId> {
        let result =
            sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
                .bind(&record.username)
                .bind(&record.password_hash)
                .bind(record.role.as_str())
                .execute(self.pool)
                .await
                .map_err(|e| AppError::from_insert(e, &record.username))?;

        Ok(result.last_insert_rowid())
    }

    /// Point lookup by exact username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Credential>> {
        let sql = format!("{SELECT_COLUMNS} WHERE username = ?");
        let record = sqlx::query_as::<_, Credential>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: CredentialId) -> Result<Option<Credential>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let record = sqlx::query_as::<_, Credential>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Replace the stored hash of an existing user.
    pub async fn update_password_hash(&self, username: &str, new_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(new_hash)
            .bind(username)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{username}'")));
        }
        Ok(())
    }

    /// Check whether a username is taken.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Count all records.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        let id = store
            .create(&NewCredential::new("alice123", "hashedpw").with_role(Role::Analyst))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let record = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.username, "alice123");
        assert_eq!(record.password_hash, "hashedpw");
        assert_eq!(record.role, Role::Analyst);
        assert!(!record.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        store
            .create(&NewCredential::new("alice123", "hash1"))
            .await
            .unwrap();
        let result = store.create(&NewCredential::new("alice123", "hash2")).await;

        match result {
            Err(AppError::DuplicateUsername(name)) => assert_eq!(name, "alice123"),
            other => panic!("Expected DuplicateUsername, got {other:?}"),
        }

        // The original record is untouched
        let record = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "hash1");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        store
            .create(&NewCredential::new("alice123", "hash"))
            .await
            .unwrap();

        assert!(store.find_by_username("ALICE123").await.unwrap().is_none());
        assert!(!store.username_exists("Alice123").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_missing() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        assert!(store.find_by_username("nobody").await.unwrap().is_none());
        assert!(store.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        let id = store
            .create(&NewCredential::new("bobby", "hash"))
            .await
            .unwrap();
        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.username, "bobby");
        assert_eq!(record.role, Role::User);
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        store
            .create(&NewCredential::new("alice123", "old"))
            .await
            .unwrap();
        store
            .update_password_hash("alice123", "new")
            .await
            .unwrap();

        let record = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "new");
    }

    #[tokio::test]
    async fn test_update_password_hash_missing_user() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        let result = store.update_password_hash("ghost", "new").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_username_exists_and_count() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.username_exists("carol").await.unwrap());

        store
            .create(&NewCredential::new("carol", "hash"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.username_exists("carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_pool_is_storage_failure() {
        let db = setup_db().await;
        let store = CredentialStore::new(db.pool());
        db.close().await;

        let err = store.find_by_username("alice123").await.unwrap_err();
        assert!(err.is_storage_failure());
    }
}
