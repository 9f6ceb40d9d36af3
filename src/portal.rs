//! In-process entry points used by the presentation layer.
//!
//! Every operation answers with a [`Reply`]: a success flag plus a message
//! that is safe to show to the end user.

use chrono::{DateTime, Utc};

use crate::auth::{
    validation, AuthService, AuthSession, LoginError, SessionContext,
};
use crate::db::Role;

/// Outcome of a portal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub success: bool,
    pub message: String,
}

impl Reply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Check a username against the username policy.
pub fn validate_username(username: &str) -> Reply {
    match validation::validate_username(username) {
        Ok(()) => Reply::ok("SUCCESS"),
        Err(e) => Reply::fail(e.to_string()),
    }
}

/// Check a password against the password policy and rate its strength.
pub fn validate_password(password: &str) -> Reply {
    match validation::validate_password(password) {
        Ok(strength) => Reply::ok(strength.message()),
        Err(e) => Reply::fail(e.to_string()),
    }
}

/// One interactive session's view of the credential core.
#[derive(Debug)]
pub struct Portal {
    service: AuthService,
    session: SessionContext,
}

impl Portal {
    /// Create a portal with its own session context.
    pub fn new(service: AuthService, session: SessionContext) -> Self {
        Self { service, session }
    }

    /// Underlying service.
    pub fn service(&self) -> &AuthService {
        &self.service
    }

    /// Register an account after running both policy checks.
    ///
    /// `role` must name one of the known roles.
    pub async fn register(&self, username: &str, password: &str, role: &str) -> Reply {
        if let Err(e) = validation::validate_username(username) {
            return Reply::fail(e.to_string());
        }
        if let Err(e) = validation::validate_password(password) {
            return Reply::fail(e.to_string());
        }
        let role: Role = match role.parse() {
            Ok(role) => role,
            Err(e) => return Reply::fail(e),
        };

        match self.service.register(username, password, role).await {
            Ok(_) => Reply::ok(format!("User '{username}' registered successfully.")),
            Err(e) => Reply::fail(e.public_message()),
        }
    }

    /// Log in now. On success the message is the role name.
    pub async fn login(&mut self, username: &str, password: &str) -> Reply {
        self.login_at(username, password, Utc::now()).await
    }

    /// Log in at an explicit instant.
    pub async fn login_at(&mut self, username: &str, password: &str, now: DateTime<Utc>) -> Reply {
        match self.try_login_at(username, password, now).await {
            Ok(session) => Reply::ok(session.role.as_str()),
            Err(e) => Reply::fail(e.public_message()),
        }
    }

    /// Log in at an explicit instant, keeping the typed error.
    pub async fn try_login_at(
        &mut self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<&AuthSession, LoginError> {
        self.session.login(&self.service, username, password, now).await
    }

    /// Current login, if still valid at `now`.
    pub fn current_session(&mut self, now: DateTime<Utc>) -> Option<&AuthSession> {
        self.session.current(now)
    }

    /// End the current login.
    pub fn logout(&mut self) -> Reply {
        match self.session.logout() {
            Some(session) => Reply::ok(format!("User '{}' logged out.", session.username)),
            None => Reply::fail("not logged in"),
        }
    }

    /// Change the password of the logged-in user.
    pub async fn change_password(
        &mut self,
        current_password: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Reply {
        let Some(username) = self.session.current(now).map(|s| s.username.clone()) else {
            return Reply::fail("not logged in");
        };
        match self
            .service
            .change_password(&username, current_password, new_password)
            .await
        {
            Ok(()) => Reply::ok("Password updated successfully."),
            Err(e) => Reply::fail(e.public_message()),
        }
    }
}
