//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};

use dashguard::auth::{AuthService, PasswordHasher, SessionContext};
use dashguard::config::HashingConfig;
use dashguard::{Database, Portal};

/// Fixed instant used as the test clock origin.
pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// `t0()` plus `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(secs)
}

/// Service over an in-memory database with cheap hashing.
pub async fn setup_service() -> (Database, AuthService) {
    let db = Database::open_in_memory().await.unwrap();
    let service = service_for(&db);
    (db, service)
}

/// Service over an existing database with cheap hashing.
pub fn service_for(db: &Database) -> AuthService {
    let hasher = PasswordHasher::new(&HashingConfig::low_cost()).unwrap();
    AuthService::new(db.pool().clone(), hasher)
}

/// Portal with a fresh session context.
pub async fn setup_portal() -> (Database, Portal) {
    let (db, service) = setup_service().await;
    (db, Portal::new(service, SessionContext::default()))
}
