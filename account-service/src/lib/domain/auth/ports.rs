use async_trait::async_trait;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::models::RegisterUserCommand;
use crate::domain::auth::models::SessionData;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::auth::errors::AuthError;
use crate::auth::errors::MailerError;
use crate::auth::errors::SessionStoreError;
use crate::auth::models::EmailAddress;
use crate::auth::models::UserUpdate;

/// Port for auth domain service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account with validated fields.
    ///
    /// # Arguments
    /// * `command` - Validated command containing name, surname, email, and password
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, AuthError>;

    /// Check credentials against the stored password hash.
    ///
    /// # Arguments
    /// * `email` - Email address of the account
    /// * `password` - Plain text password to verify
    ///
    /// # Returns
    /// The authenticated user entity
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `AccountDisabled` - Credentials are correct but the account is disabled
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Issue an access and refresh token pair and record the session.
    ///
    /// # Arguments
    /// * `user` - The authenticated account
    ///
    /// # Returns
    /// Bearer token pair
    ///
    /// # Errors
    /// * `StoreUnavailable` - Session store operation failed
    /// * `Unknown` - Token signing failed
    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError>;

    /// Rotate a refresh token into a fresh token pair.
    ///
    /// # Arguments
    /// * `refresh_token` - The refresh token presented by the client
    ///
    /// # Returns
    /// Fresh bearer token pair; the presented token is no longer valid
    ///
    /// # Errors
    /// * `InvalidToken` - Token is expired, revoked, rotated out, or otherwise unusable
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Start a password reset for the given email address.
    ///
    /// Always acknowledges with the same message whether or not the account
    /// exists, so callers cannot probe for registered emails.
    ///
    /// # Arguments
    /// * `email` - Email address the reset was requested for
    ///
    /// # Returns
    /// Constant acknowledgement message
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn request_password_reset(&self, email: &str) -> Result<String, AuthError>;

    /// Complete a password reset with a previously issued reset token.
    ///
    /// # Arguments
    /// * `token` - Reset token from the reset email
    /// * `new_password` - Replacement plain text password
    ///
    /// # Returns
    /// Confirmation message
    ///
    /// # Errors
    /// * `InvalidResetToken` - Token is expired, already used, or not the latest issued
    /// * `DatabaseError` - Database operation failed
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError>;

    /// End a session, revoking its tokens.
    ///
    /// # Arguments
    /// * `user_id` - Account whose session ends
    /// * `access_token` - The access token presented with the request
    ///
    /// # Returns
    /// Confirmation message
    ///
    /// # Errors
    /// * `StoreUnavailable` - Session store operation failed
    async fn logout(&self, user_id: &UserId, access_token: &str) -> Result<String, AuthError>;

    /// Resolve an access token to the account it belongs to.
    ///
    /// # Arguments
    /// * `access_token` - The access token presented with the request
    ///
    /// # Returns
    /// The account the token was issued for
    ///
    /// # Errors
    /// * `InvalidToken` - Token is expired, revoked, or malformed
    /// * `AccountDisabled` - Account was disabled after the token was issued
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;
}

/// Persistence operations for user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Retrieve user by identifier.
    ///
    /// # Arguments
    /// * `id` - User ID
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Retrieve user by email address.
    ///
    /// # Arguments
    /// * `email` - Email address string
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - User entity to create
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Apply a partial update to an existing user.
    ///
    /// # Arguments
    /// * `id` - User ID to update
    /// * `update` - Fields to change
    ///
    /// # Returns
    /// Updated user entity (None if the user does not exist)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>, AuthError>;
}

/// Token and session state held outside the database.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Record the current refresh token for a user, replacing any previous one.
    ///
    /// # Arguments
    /// * `user_id` - Account the token belongs to
    /// * `token` - The refresh token string
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn store_refresh_token(
        &self,
        user_id: &UserId,
        token: &str,
    ) -> Result<(), SessionStoreError>;

    /// Retrieve the current refresh token for a user.
    ///
    /// # Arguments
    /// * `user_id` - Account to look up
    ///
    /// # Returns
    /// The stored token (None if no session exists or it expired)
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    /// * `Corrupt` - Stored record could not be decoded
    async fn get_refresh_token(&self, user_id: &UserId) -> Result<Option<String>, SessionStoreError>;

    /// Delete the stored refresh token for a user.
    ///
    /// # Arguments
    /// * `user_id` - Account to revoke
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn revoke_refresh_token(&self, user_id: &UserId) -> Result<(), SessionStoreError>;

    /// Blacklist an access token until it expires on its own.
    ///
    /// # Arguments
    /// * `token` - The access token string
    /// * `expires_at` - When the token expires; already-expired tokens are skipped
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn store_blacklisted(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError>;

    /// Check whether an access token has been blacklisted.
    ///
    /// # Arguments
    /// * `token` - The access token string
    ///
    /// # Returns
    /// True if the token was revoked
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn is_blacklisted(&self, token: &str) -> Result<bool, SessionStoreError>;

    /// Record session metadata for a user.
    ///
    /// # Arguments
    /// * `user_id` - Account the session belongs to
    /// * `session` - Session snapshot to store
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn store_session(
        &self,
        user_id: &UserId,
        session: &SessionData,
    ) -> Result<(), SessionStoreError>;

    /// Retrieve session metadata for a user.
    ///
    /// # Arguments
    /// * `user_id` - Account to look up
    ///
    /// # Returns
    /// The stored session (None if no session exists or it expired)
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    /// * `Corrupt` - Stored record could not be decoded
    async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionData>, SessionStoreError>;

    /// Delete the session and refresh token for a user.
    ///
    /// # Arguments
    /// * `user_id` - Account whose session ends
    ///
    /// # Errors
    /// * `Unavailable` - Store operation failed
    async fn revoke_session(&self, user_id: &UserId) -> Result<(), SessionStoreError>;
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send a password reset email carrying the reset token.
    ///
    /// # Arguments
    /// * `to` - Recipient address
    /// * `reset_token` - Token to embed in the reset link
    ///
    /// # Errors
    /// * `BuildFailed` - Message could not be constructed
    /// * `SendFailed` - SMTP delivery failed
    async fn send_reset_email(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailerError>;
}
