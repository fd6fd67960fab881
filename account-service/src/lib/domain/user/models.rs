use std::fmt;
use std::str::FromStr;

use auth::TokenIdentity;
use chrono::DateTime;
use chrono::Utc;

use crate::user::errors::EmailError;
use crate::user::errors::ProfileError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account. `password_hash` is only ever changed
/// by the password-change flow.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile: Profile,
    /// Generation embedded in the currently valid refresh token.
    pub refresh_generation: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity embedded in tokens issued for this user.
    pub fn token_identity(&self) -> TokenIdentity {
        TokenIdentity::new(self.email.as_str(), self.id.0)
    }
}

/// User unique identifier type, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a positive integer
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))?;
        UserId::try_from(id)
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserIdError;

    /// Store-assigned ids start at 1.
    fn try_from(id: i64) -> Result<Self, Self::Error> {
        if id > 0 {
            Ok(UserId(id))
        } else {
            Err(UserIdError::InvalidFormat(format!("{} is not positive", id)))
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Stored as given:
/// comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MAX_LENGTH: usize = 100;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `TooLong` - Email longer than 100 characters
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let length = email.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Profile fields carried alongside the credentials.
///
/// Opaque to authentication; only length limits are enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    first_name: String,
    last_name: String,
    location: String,
    home_gym: Option<String>,
    grade_style: String,
}

impl Profile {
    const MAX_LENGTH: usize = 50;

    /// Create a validated profile.
    ///
    /// # Errors
    /// * `Empty` - A required field is empty or blank
    /// * `TooLong` - A field exceeds 50 characters
    pub fn new(
        first_name: String,
        last_name: String,
        location: String,
        home_gym: Option<String>,
        grade_style: String,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            first_name: Self::required("first_name", first_name)?,
            last_name: Self::required("last_name", last_name)?,
            location: Self::required("location", location)?,
            home_gym: home_gym
                .map(|gym| Self::bounded("home_gym", gym))
                .transpose()?,
            grade_style: Self::required("grade_style", grade_style)?,
        })
    }

    /// Apply a partial update, re-validating every changed field.
    ///
    /// # Errors
    /// * `Empty` / `TooLong` - A provided field is invalid
    pub fn patched(&self, command: UpdateUserCommand) -> Result<Self, ProfileError> {
        Self::new(
            command.first_name.unwrap_or_else(|| self.first_name.clone()),
            command.last_name.unwrap_or_else(|| self.last_name.clone()),
            command.location.unwrap_or_else(|| self.location.clone()),
            command.home_gym.unwrap_or_else(|| self.home_gym.clone()),
            command.grade_style.unwrap_or_else(|| self.grade_style.clone()),
        )
    }

    fn required(field: &'static str, value: String) -> Result<String, ProfileError> {
        if value.trim().is_empty() {
            return Err(ProfileError::Empty { field });
        }
        Self::bounded(field, value)
    }

    fn bounded(field: &'static str, value: String) -> Result<String, ProfileError> {
        let actual = value.chars().count();
        if actual > Self::MAX_LENGTH {
            Err(ProfileError::TooLong {
                field,
                max: Self::MAX_LENGTH,
                actual,
            })
        } else {
            Ok(value)
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn home_gym(&self) -> Option<&str> {
        self.home_gym.as_deref()
    }

    pub fn grade_style(&self) -> &str {
        &self.grade_style
    }
}

/// Record handed to the store on registration; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile: Profile,
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub email: EmailAddress,
    pub password: String,
    pub profile: Profile,
}

impl RegisterUserCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    /// * `profile` - Validated profile fields
    pub fn new(email: EmailAddress, password: String, profile: Profile) -> Self {
        Self {
            email,
            password,
            profile,
        }
    }
}

/// Partial update of the profile fields.
///
/// Only provided fields are changed. `home_gym: Some(None)` clears the gym.
/// Email and password are deliberately absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateUserCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub home_gym: Option<Option<String>>,
    pub grade_style: Option<String>,
}

/// Command to replace the password of an authenticated user.
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}
