//! Bulk import of legacy `users.txt` records.
//!
//! Each non-blank line is `username,password_hash[,role]`. The hash is
//! stored as-is (legacy files carry bcrypt strings). A bad line never
//! aborts the batch, and usernames already in the store are skipped so the
//! import can be re-run.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::db::{CredentialStore, NewCredential, Role};
use crate::{AppError, Result};

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records inserted.
    pub imported: usize,
    /// Lines whose username was already stored.
    pub skipped_existing: usize,
    /// Malformed lines and lines the store rejected.
    pub failed: usize,
}

impl ImportReport {
    /// Total non-blank lines seen.
    pub fn total(&self) -> usize {
        self.imported + self.skipped_existing + self.failed
    }
}

/// Parse one record line. Returns `None` for a malformed line.
fn parse_line(line: &str) -> Option<NewCredential> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (username, hash, role) = match fields.as_slice() {
        [username, hash] => (*username, *hash, Role::default()),
        [username, hash, role] => (*username, *hash, role.parse::<Role>().ok()?),
        _ => return None,
    };
    if username.is_empty() || hash.is_empty() {
        return None;
    }
    Some(NewCredential::new(username, hash).with_role(role))
}

/// Import records from in-memory text.
///
/// Fails only if the connection to the store is lost. Other per-line
/// storage errors are counted as failed lines.
pub async fn import_legacy_lines(store: &CredentialStore<'_>, text: &str) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(record) = parse_line(line) else {
            warn!(line = line_no, "Skipping malformed legacy user record");
            report.failed += 1;
            continue;
        };

        match store.username_exists(&record.username).await {
            Ok(false) => {}
            Ok(true) => {
                debug!(username = %record.username, "Legacy user already present, skipping");
                report.skipped_existing += 1;
                continue;
            }
            Err(e @ AppError::DatabaseConnection(_)) => return Err(e),
            Err(e) => {
                warn!(
                    line = line_no,
                    username = %record.username,
                    error = %e,
                    "Failed to check legacy user"
                );
                report.failed += 1;
                continue;
            }
        }

        match store.create(&record).await {
            Ok(_) => report.imported += 1,
            Err(AppError::DuplicateUsername(name)) => {
                debug!(username = %name, "Legacy user inserted concurrently, skipping");
                report.skipped_existing += 1;
            }
            Err(e @ AppError::DatabaseConnection(_)) => return Err(e),
            Err(e) => {
                warn!(
                    line = line_no,
                    username = %record.username,
                    error = %e,
                    "Failed to import legacy user"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        imported = report.imported,
        skipped_existing = report.skipped_existing,
        failed = report.failed,
        "Legacy user import finished"
    );
    Ok(report)
}

/// Import records from a legacy file.
///
/// A missing file yields an empty report.
pub async fn import_legacy_users(
    store: &CredentialStore<'_>,
    path: impl AsRef<Path>,
) -> Result<ImportReport> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "Legacy users file not found, nothing to import");
        return Ok(ImportReport::default());
    }

    let text = tokio::fs::read_to_string(path).await?;
    info!(path = %path.display(), "Importing legacy users");
    import_legacy_lines(store, &text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_parse_line() {
        let record = parse_line("alice123,$2b$12$abc,analyst").unwrap();
        assert_eq!(record.username, "alice123");
        assert_eq!(record.password_hash, "$2b$12$abc");
        assert_eq!(record.role, Role::Analyst);

        let record = parse_line(" bobby , hash ").unwrap();
        assert_eq!(record.username, "bobby");
        assert_eq!(record.role, Role::User);
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(parse_line("justausername").is_none());
        assert!(parse_line(",hash,user").is_none());
        assert!(parse_line("carol,,user").is_none());
        assert!(parse_line("carol,hash,superuser").is_none());
        assert!(parse_line("carol,hash,user,extra").is_none());
    }

    #[tokio::test]
    async fn test_import_lines() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());

        let text = "alice123,hash1,analyst\n\nbobby,hash2\nbroken line\ncarol,hash3,root\n";
        let report = import_legacy_lines(&store, text).await.unwrap();

        assert_eq!(
            report,
            ImportReport {
                imported: 2,
                skipped_existing: 0,
                failed: 2,
            }
        );
        assert_eq!(report.total(), 4);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reimport_skips_existing() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());
        store
            .create(&NewCredential::new("alice123", "current"))
            .await
            .unwrap();

        let text = "alice123,legacy,admin\nbobby,hash2,user\n";
        let first = import_legacy_lines(&store, text).await.unwrap();
        assert_eq!(first.imported, 1);
        assert_eq!(first.skipped_existing, 1);

        let second = import_legacy_lines(&store, text).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped_existing, 2);

        // The existing record is not overwritten
        let record = store.find_by_username("alice123").await.unwrap().unwrap();
        assert_eq!(record.password_hash, "current");
        assert_eq!(record.role, Role::User);
    }

    #[tokio::test]
    async fn test_duplicate_lines_in_one_file() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());

        let report = import_legacy_lines(&store, "dave1,h1\ndave1,h2\n").await.unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped_existing, 1);
    }

    #[tokio::test]
    async fn test_storage_error_counts_lines_as_failed() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());
        sqlx::query("DROP TABLE users")
            .execute(db.pool())
            .await
            .unwrap();

        let report = import_legacy_lines(&store, "erin1,h1\nfrank1,h2,admin\n")
            .await
            .unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 0,
                skipped_existing: 0,
                failed: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_lost_connection_aborts_import() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());
        db.close().await;

        let result = import_legacy_lines(&store, "erin1,h1\n").await;
        assert!(matches!(result, Err(AppError::DatabaseConnection(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_report() {
        let db = Database::open_in_memory().await.unwrap();
        let store = CredentialStore::new(db.pool());

        let report = import_legacy_users(&store, "/nonexistent/users.txt")
            .await
            .unwrap();
        assert_eq!(report, ImportReport::default());
    }
}
