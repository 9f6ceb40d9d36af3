//! Per-username brute-force lockout.
//!
//! A [`LockoutTracker`] lives exactly as long as the session context that
//! owns it. Entries move through `Fresh` (no entry) -> `Active` -> `Locked`
//! and back to `Active` with a full attempt budget once the lock expires.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::AuthConfig;

/// Maximum failed attempts before lockout.
pub const MAX_ATTEMPTS: u32 = 3;

/// Lockout duration (5 minutes).
pub const LOCKOUT_DURATION_SECS: u64 = 5 * 60;

/// Result of an authentication attempt, as fed to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// Why an attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Wrong credentials; more attempts remain.
    InvalidCredentials { attempts_remaining: u32 },
    /// This failure used the last attempt and started a lockout.
    AttemptsExhausted { locked_until: DateTime<Utc> },
    /// The username was already locked when the attempt arrived.
    LockedOut { locked_until: DateTime<Utc> },
}

/// Tracker decision for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject(RejectReason),
}

impl Decision {
    /// Check if the attempt was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Lockout state for one username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutEntry {
    /// Attempts left before a lock. Never negative; zero only while locked.
    pub attempts_remaining: u32,
    /// End of the current lock, if any.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutEntry {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts_remaining: max_attempts,
            locked_until: None,
        }
    }
}

/// Session-scoped lockout tracker keyed by username.
#[derive(Debug)]
pub struct LockoutTracker {
    entries: HashMap<String, LockoutEntry>,
    max_attempts: u32,
    lockout: chrono::Duration,
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LockoutTracker {
    /// Create a tracker with the default policy (3 attempts, 5 minutes).
    pub fn new() -> Self {
        Self::with_config(MAX_ATTEMPTS, Duration::from_secs(LOCKOUT_DURATION_SECS))
    }

    /// Create a tracker with a custom policy.
    pub fn with_config(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_attempts: max_attempts.max(1),
            lockout: chrono::Duration::from_std(lockout)
                .unwrap_or_else(|_| chrono::Duration::days(365 * 100)),
        }
    }

    /// Create a tracker from the `[auth]` configuration section.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::with_config(config.max_attempts, config.lockout())
    }

    /// Configured attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Current state for a username, if it has one.
    pub fn entry(&self, username: &str) -> Option<&LockoutEntry> {
        self.entries.get(username)
    }

    /// Number of tracked usernames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no username is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset an entry whose lock has expired. Returns the lock end if the
    /// username is still locked at `now`.
    fn refresh(&mut self, username: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let max_attempts = self.max_attempts;
        let entry = self.entries.get_mut(username)?;
        match entry.locked_until {
            Some(until) if now < until => Some(until),
            Some(_) => {
                debug!(username = %username, "Lockout expired, attempts reset");
                *entry = LockoutEntry::new(max_attempts);
                None
            }
            None => None,
        }
    }

    /// Check whether an attempt for `username` may proceed at `now`.
    ///
    /// Returns the lock end when the username is locked. An expired lock is
    /// cleared as a side effect.
    pub fn check(&mut self, username: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.refresh(username, now)
    }

    /// Record the outcome of an attempt and decide whether it stands.
    pub fn record_attempt(
        &mut self,
        username: &str,
        outcome: AttemptOutcome,
        now: DateTime<Utc>,
    ) -> Decision {
        if let Some(locked_until) = self.refresh(username, now) {
            warn!(username = %username, %locked_until, "Login attempt rejected: username locked");
            return Decision::Reject(RejectReason::LockedOut { locked_until });
        }

        if outcome == AttemptOutcome::Success {
            self.entries.remove(username);
            return Decision::Allow;
        }

        let max_attempts = self.max_attempts;
        let lockout = self.lockout;
        let entry = self
            .entries
            .entry(username.to_string())
            .or_insert_with(|| LockoutEntry::new(max_attempts));
        entry.attempts_remaining = entry.attempts_remaining.saturating_sub(1);

        if entry.attempts_remaining == 0 {
            let locked_until = now
                .checked_add_signed(lockout)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            entry.locked_until = Some(locked_until);
            warn!(username = %username, %locked_until, "Too many failed attempts, username locked");
            Decision::Reject(RejectReason::AttemptsExhausted { locked_until })
        } else {
            debug!(
                username = %username,
                attempts_remaining = entry.attempts_remaining,
                "Recorded failed login attempt"
            );
            Decision::Reject(RejectReason::InvalidCredentials {
                attempts_remaining: entry.attempts_remaining,
            })
        }
    }

    /// Drop entries whose lock has expired or whose budget is untouched.
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let max_attempts = self.max_attempts;
        self.entries.retain(|_, entry| match entry.locked_until {
            Some(until) => now < until,
            None => entry.attempts_remaining < max_attempts,
        });
    }
}

/// Lockout tracker shared between concurrent sessions.
///
/// Each call holds the lock for the whole read-modify-write, so concurrent
/// failures for one username are never under-counted.
#[derive(Debug, Default)]
pub struct SharedLockoutTracker {
    inner: Mutex<LockoutTracker>,
}

impl SharedLockoutTracker {
    /// Wrap a tracker.
    pub fn new(tracker: LockoutTracker) -> Self {
        Self {
            inner: Mutex::new(tracker),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LockoutTracker> {
        // A poisoned tracker still holds consistent counters
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// See [`LockoutTracker::check`].
    pub fn check(&self, username: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lock().check(username, now)
    }

    /// See [`LockoutTracker::record_attempt`].
    pub fn record_attempt(
        &self,
        username: &str,
        outcome: AttemptOutcome,
        now: DateTime<Utc>,
    ) -> Decision {
        self.lock().record_attempt(username, outcome, now)
    }

    /// Snapshot of the entry for a username.
    pub fn entry(&self, username: &str) -> Option<LockoutEntry> {
        self.lock().entry(username).cloned()
    }
}
