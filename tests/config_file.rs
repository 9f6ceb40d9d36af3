//! Configuration loading from disk.

use dashguard::auth::{LockoutTracker, SessionContext};
use dashguard::Config;

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[database]
path = "var/users.db"

[auth]
max_attempts = 5
lockout_secs = 60

[import]
legacy_users_file = "data/users.txt"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.database.path, "var/users.db");
    assert_eq!(config.auth.max_attempts, 5);
    assert_eq!(config.auth.session_duration_secs, 300);
    assert_eq!(config.hashing.memory_kib, 65536);
    assert!(config.legacy_users_file().is_some());

    assert_eq!(LockoutTracker::from_config(&config.auth).max_attempts(), 5);
    let ctx = SessionContext::from_config(&config.auth);
    assert_eq!(ctx.tracker().max_attempts(), 5);
}

#[test]
fn test_missing_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(dir.path().join("absent.toml")).is_err());
}
