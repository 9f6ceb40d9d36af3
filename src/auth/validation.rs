//! Username and password policy.
//!
//! Pure acceptance rules with no I/O. Every check runs in a fixed order and
//! the first violation is returned.

use std::fmt;

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 4;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 50;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("username cannot be empty")]
    UsernameEmpty,

    /// Username starts with a digit.
    #[error("username cannot start with a digit")]
    UsernameStartsWithDigit,

    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters long")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username can be at most {MAX_USERNAME_LENGTH} characters long")]
    UsernameTooLong,

    /// Username contains a space.
    #[error("username cannot contain spaces")]
    UsernameContainsSpace,

    /// Username contains a non-alphanumeric character.
    #[error("username cannot contain special characters")]
    UsernameInvalidChars,

    /// Password is empty.
    #[error("password cannot be empty")]
    PasswordEmpty,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password can be at most {MAX_PASSWORD_LENGTH} characters long")]
    PasswordTooLong,

    /// Password starts or ends with whitespace.
    #[error("password can neither start nor end with whitespace")]
    PasswordEdgeWhitespace,

    /// Password has no letter or digit at all.
    #[error("password must contain at least one letter or digit")]
    PasswordNoLetterOrDigit,
}

/// Common passwords that never earn the blacklist point.
const COMMON_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "123456789",
    "12345678",
    "12345",
    "111111",
    "1234567",
    "sunshine",
    "qwerty",
    "iloveyou",
    "princess",
    "admin",
    "welcome",
    "666666",
    "abc123",
    "football",
    "123123",
    "monkey",
    "654321",
    "!@#$%^&*",
];

/// Check if a password is on the common-password list (case-insensitive).
pub fn is_common_password(password: &str) -> bool {
    let lower = password.to_lowercase();
    COMMON_PASSWORDS.iter().any(|&p| p == lower)
}

/// Advisory password strength. Never blocks registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    /// Map a 0-6 score to a strength level.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=1 => PasswordStrength::Weak,
            2..=3 => PasswordStrength::Medium,
            _ => PasswordStrength::Strong,
        }
    }

    /// Short label.
    pub fn label(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "WEAK",
            PasswordStrength::Medium => "MEDIUM",
            PasswordStrength::Strong => "STRONG",
        }
    }

    /// Message shown next to the password field.
    pub fn message(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "WEAK: your password is very weak",
            PasswordStrength::Medium => "MEDIUM: your password is of medium strength",
            PasswordStrength::Strong => "STRONG: your password is strong",
        }
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validate a username.
///
/// Rules, in order:
/// - not empty
/// - first character is not a digit
/// - length: 4-20 characters
/// - no spaces
/// - alphanumeric characters only
///
/// # Examples
///
/// ```
/// use dashguard::auth::validation::validate_username;
///
/// assert!(validate_username("abcd").is_ok());
/// assert!(validate_username("1abcd").is_err());
/// assert!(validate_username("ab_cd").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let Some(first) = username.chars().next() else {
        return Err(ValidationError::UsernameEmpty);
    };
    if first.is_ascii_digit() {
        return Err(ValidationError::UsernameStartsWithDigit);
    }

    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }

    if username.contains(' ') {
        return Err(ValidationError::UsernameContainsSpace);
    }
    if !username.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::UsernameInvalidChars);
    }

    Ok(())
}

/// Per-class character counts of a password.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CharClasses {
    lower: usize,
    upper: usize,
    digit: usize,
    special: usize,
}

impl CharClasses {
    fn count(password: &str) -> Self {
        let mut classes = Self::default();
        for c in password.chars() {
            if !c.is_alphanumeric() {
                classes.special += 1;
            } else if c.is_lowercase() {
                classes.lower += 1;
            } else if c.is_uppercase() {
                classes.upper += 1;
            } else if c.is_ascii_digit() {
                classes.digit += 1;
            }
        }
        classes
    }
}

/// Score a password that already passed the acceptance rules.
///
/// One point each for: length > 8, more than one lowercase letter, more than
/// one uppercase letter, more than one digit, more than one non-alphanumeric
/// character, and not being a common password.
pub fn password_score(password: &str) -> u8 {
    let classes = CharClasses::count(password);
    [
        password.chars().count() > 8,
        classes.lower > 1,
        classes.upper > 1,
        classes.digit > 1,
        classes.special > 1,
        !is_common_password(password),
    ]
    .into_iter()
    .map(u8::from)
    .sum()
}

/// Validate a password and rate its strength.
///
/// Rules, in order:
/// - not empty
/// - length: 6-50 characters
/// - does not start or end with whitespace
/// - contains at least one lowercase letter, uppercase letter or digit
///
/// # Examples
///
/// ```
/// use dashguard::auth::validation::{validate_password, PasswordStrength};
///
/// assert!(validate_password("short").is_err());
/// assert_eq!(validate_password("alllowercase"), Ok(PasswordStrength::Medium));
/// ```
pub fn validate_password(password: &str) -> Result<PasswordStrength, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }

    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    let starts_ws = password.chars().next().is_some_and(char::is_whitespace);
    let ends_ws = password.chars().next_back().is_some_and(char::is_whitespace);
    if starts_ws || ends_ws {
        return Err(ValidationError::PasswordEdgeWhitespace);
    }

    let classes = CharClasses::count(password);
    if classes.lower == 0 && classes.upper == 0 && classes.digit == 0 {
        return Err(ValidationError::PasswordNoLetterOrDigit);
    }

    Ok(PasswordStrength::from_score(password_score(password)))
}
