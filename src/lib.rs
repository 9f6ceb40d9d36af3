//! dashguard - credential management for a multi-domain dashboard.
//!
//! Registers accounts, authenticates logins and applies per-username
//! brute-force lockout within an interactive session.

pub mod auth;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod portal;

pub use auth::{
    AttemptOutcome, AuthError, AuthService, AuthSession, Decision, LockoutTracker, LoginError,
    PasswordError, PasswordHasher, PasswordStrength, RejectReason, SessionContext,
    SharedLockoutTracker, ValidationError,
};
pub use config::Config;
pub use db::{Credential, CredentialId, CredentialStore, Database, NewCredential, Role};
pub use error::{AppError, Result};
pub use import::{import_legacy_lines, import_legacy_users, ImportReport};
pub use portal::{Portal, Reply};
