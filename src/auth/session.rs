//! Interactive session state.
//!
//! A [`SessionContext`] scopes one interactive session: its lockout
//! tracker and its current login. Expiry is checked explicitly against the
//! caller's clock on every access.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::lockout::{AttemptOutcome, Decision, LockoutTracker, RejectReason};
use crate::auth::service::{AuthError, AuthService, INVALID_CREDENTIALS_MESSAGE};
use crate::config::AuthConfig;
use crate::db::Role;

/// Default session duration (5 minutes).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 5 * 60;

/// Session-level login errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Wrong username or password; more attempts remain.
    #[error("invalid credentials, {attempts_remaining} attempt(s) remaining")]
    InvalidCredentials { attempts_remaining: u32 },

    /// The last attempt was used up and the username is now locked.
    #[error("too many failed attempts, locked until {locked_until}")]
    AttemptsExhausted { locked_until: DateTime<Utc> },

    /// The username was already locked.
    #[error("account locked until {locked_until}")]
    LockedOut { locked_until: DateTime<Utc> },

    /// The credential store could not serve the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Password hashing failed.
    #[error("hashing error: {0}")]
    Hashing(String),
}

impl LoginError {
    /// Message safe to show to the end user.
    pub fn public_message(&self) -> String {
        match self {
            LoginError::InvalidCredentials { attempts_remaining } => format!(
                "{INVALID_CREDENTIALS_MESSAGE}. {attempts_remaining} attempt(s) remaining."
            ),
            LoginError::AttemptsExhausted { locked_until } => format!(
                "Too many failed attempts. Try again after {}.",
                locked_until.format("%H:%M:%S UTC")
            ),
            LoginError::LockedOut { locked_until } => format!(
                "Account is locked. Try again after {}.",
                locked_until.format("%H:%M:%S UTC")
            ),
            LoginError::StorageUnavailable(_) => {
                "service temporarily unavailable, please try again later".to_string()
            }
            LoginError::Hashing(_) => "internal error while processing password".to_string(),
        }
    }
}

impl From<RejectReason> for LoginError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::InvalidCredentials { attempts_remaining } => {
                LoginError::InvalidCredentials { attempts_remaining }
            }
            RejectReason::AttemptsExhausted { locked_until } => {
                LoginError::AttemptsExhausted { locked_until }
            }
            RejectReason::LockedOut { locked_until } => LoginError::LockedOut { locked_until },
        }
    }
}

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Unique session token (UUID v4).
    pub token: String,
    /// Logged-in username.
    pub username: String,
    /// Role read from the credential record.
    pub role: Role,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a session starting at `now`.
    pub fn new(
        username: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        // Saturate instead of overflowing on absurd durations
        let expires_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            token: Uuid::new_v4().to_string(),
            username: username.into(),
            role,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left until expiry, if any.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let remaining = self.expires_at - now;
        if remaining > chrono::Duration::zero() {
            Some(remaining)
        } else {
            None
        }
    }
}

/// State of one interactive session.
#[derive(Debug)]
pub struct SessionContext {
    tracker: LockoutTracker,
    session_duration: Duration,
    current: Option<AuthSession>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(
            LockoutTracker::new(),
            Duration::from_secs(DEFAULT_SESSION_DURATION_SECS),
        )
    }
}

impl SessionContext {
    /// Create a context with its own lockout tracker.
    pub fn new(tracker: LockoutTracker, session_duration: Duration) -> Self {
        Self {
            tracker,
            session_duration,
            current: None,
        }
    }

    /// Create a context from the `[auth]` configuration section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(LockoutTracker::from_config(config), config.session_duration())
    }

    /// Lockout state of this session.
    pub fn tracker(&self) -> &LockoutTracker {
        &self.tracker
    }

    /// Authenticate through `service`, applying this session's lockout.
    ///
    /// A locked username is rejected before the store is consulted. Both
    /// credential mismatches count as failures. Storage errors do not.
    pub async fn login(
        &mut self,
        service: &AuthService,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<&AuthSession, LoginError> {
        self.tracker.cleanup(now);
        if let Some(locked_until) = self.tracker.check(username, now) {
            warn!(username = %username, %locked_until, "Login attempt rejected: username locked");
            return Err(LoginError::LockedOut { locked_until });
        }

        let outcome = match service.login(username, password).await {
            Ok(role) => Ok(role),
            Err(e) if e.is_credential_mismatch() => Err(()),
            Err(AuthError::Password(e)) => return Err(LoginError::Hashing(e.to_string())),
            Err(e) => return Err(LoginError::StorageUnavailable(e.to_string())),
        };

        let attempt = if outcome.is_ok() {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::Failure
        };

        match (self.tracker.record_attempt(username, attempt, now), outcome) {
            (Decision::Allow, Ok(role)) => {
                let session = AuthSession::new(username, role, now, self.session_duration);
                info!(
                    username = %username,
                    role = %role,
                    expires_at = %session.expires_at,
                    "Session started"
                );
                Ok(&*self.current.insert(session))
            }
            (Decision::Reject(reason), _) => Err(reason.into()),
            // Failures always reject
            (Decision::Allow, Err(())) => Err(LoginError::InvalidCredentials {
                attempts_remaining: self.tracker.max_attempts(),
            }),
        }
    }

    /// The current login, if it has not expired at `now`.
    ///
    /// An expired login is dropped.
    pub fn current(&mut self, now: DateTime<Utc>) -> Option<&AuthSession> {
        if self
            .current
            .as_ref()
            .is_some_and(|session| session.is_expired_at(now))
        {
            if let Some(session) = self.current.take() {
                info!(username = %session.username, "Session expired");
            }
        }
        self.current.as_ref()
    }

    /// Returns true if a login is active at `now`.
    pub fn is_logged_in(&mut self, now: DateTime<Utc>) -> bool {
        self.current(now).is_some()
    }

    /// End the current login, returning it.
    pub fn logout(&mut self) -> Option<AuthSession> {
        let session = self.current.take();
        if let Some(ref s) = session {
            debug!(username = %s.username, token = %s.token, "Session ended");
            info!(username = %s.username, "User logged out");
        }
        session
    }
}
