//! Authentication module for dashguard.
//!
//! This module provides username/password policy checks, password hashing,
//! registration and login, and session-scoped brute-force lockout.

pub mod lockout;
mod password;
mod service;
mod session;
pub mod validation;

pub use lockout::{
    AttemptOutcome, Decision, LockoutEntry, LockoutTracker, RejectReason, SharedLockoutTracker,
    LOCKOUT_DURATION_SECS, MAX_ATTEMPTS,
};
pub use password::{is_bcrypt_hash, PasswordError, PasswordHasher};
pub use service::{AuthError, AuthService, INVALID_CREDENTIALS_MESSAGE};
pub use session::{AuthSession, LoginError, SessionContext, DEFAULT_SESSION_DURATION_SECS};
pub use validation::{validate_password, validate_username, PasswordStrength, ValidationError};
