use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::errors::EmailError;
use crate::auth::errors::RoleError;
use crate::auth::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered account, including the credential material and
/// password-reset state the auth flows operate on.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub email: EmailAddress,
    pub hashed_password: String,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub disabled: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Role assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
    Doctor,
}

impl UserRole {
    /// Get role as string slice.
    ///
    /// # Returns
    /// Role name as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::Doctor => "doctor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "doctor" => Ok(UserRole::Doctor),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub name: String,
    pub surname: String,
    pub email: EmailAddress,
    pub password: String,
    pub phone: Option<String>,
}

impl RegisterUserCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `name` - Given name
    /// * `surname` - Family name
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    /// * `phone` - Optional phone number
    ///
    /// # Returns
    /// RegisterUserCommand with validated fields
    pub fn new(
        name: String,
        surname: String,
        email: EmailAddress,
        password: String,
        phone: Option<String>,
    ) -> Self {
        Self {
            name,
            surname,
            email,
            password,
            phone,
        }
    }
}

/// Partial update to an account record.
///
/// Outer `None` leaves a column untouched. For nullable columns the inner
/// `Option` is the new value, so `Some(None)` clears the column.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub reset_token: Option<Option<String>>,
    pub reset_token_expires: Option<Option<DateTime<Utc>>>,
}

/// Snapshot of a login recorded alongside the refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub login_time: DateTime<Utc>,
}

impl SessionData {
    /// Build the session snapshot recorded when `user` logs in.
    ///
    /// # Arguments
    /// * `user` - The account that just authenticated
    ///
    /// # Returns
    /// SessionData stamped with the current time
    pub fn for_login(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            login_time: Utc::now(),
        }
    }
}

/// Access and refresh token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPair {
    /// Construct a bearer token pair.
    ///
    /// # Arguments
    /// * `access_token` - Short-lived access token
    /// * `refresh_token` - Long-lived refresh token
    ///
    /// # Returns
    /// TokenPair with token type "bearer"
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}
