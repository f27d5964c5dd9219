use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::auth::models::RegisterUserCommand;
use crate::domain::auth::models::SessionData;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;
use crate::domain::auth::models::UserRole;
use crate::domain::auth::models::UserUpdate;
use crate::auth::errors::AuthError;
use crate::auth::ports::AuthServicePort;
use crate::auth::ports::Mailer;
use crate::auth::ports::SessionStore;
use crate::auth::ports::UserDirectory;

/// Acknowledgement returned for every reset request, found account or not.
pub const RESET_REQUEST_ACK: &str = "If user exists, reset email will be sent";

/// Confirmation returned after a successful password reset.
pub const PASSWORD_RESET_OK: &str = "Password successfully reset";

/// Confirmation returned after logout.
pub const LOGOUT_OK: &str = "Successfully logged out";

/// Domain service implementation for authentication and session operations.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<D, S, M>
where
    D: UserDirectory,
    S: SessionStore,
    M: Mailer,
{
    directory: Arc<D>,
    sessions: Arc<S>,
    mailer: Arc<M>,
    codec: security::TokenCodec,
    password_hasher: security::PasswordHasher,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl<D, S, M> AuthService<D, S, M>
where
    D: UserDirectory,
    S: SessionStore,
    M: Mailer,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `directory` - User persistence implementation
    /// * `sessions` - Token and session state implementation
    /// * `mailer` - Outbound email implementation
    /// * `codec` - Token codec configured with the signing secret
    /// * `access_ttl` - Lifetime of issued access tokens
    /// * `refresh_ttl` - Lifetime of issued refresh tokens
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(
        directory: Arc<D>,
        sessions: Arc<S>,
        mailer: Arc<M>,
        codec: security::TokenCodec,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            directory,
            sessions,
            mailer,
            codec,
            password_hasher: security::PasswordHasher::new(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Resolve a token to a user id, rejecting blacklisted tokens first.
    async fn verified_user_id(&self, token: &str) -> Result<UserId, AuthError> {
        if self.sessions.is_blacklisted(token).await? {
            return Err(AuthError::InvalidToken);
        }

        let subject = self
            .codec
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;

        UserId::from_string(&subject).map_err(|_| AuthError::InvalidToken)
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.verified_user_id(refresh_token).await?;

        // Only the most recently issued refresh token is accepted.
        let stored = self.sessions.get_refresh_token(&user_id).await?;
        if stored.as_deref() != Some(refresh_token) {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .directory
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.sessions.revoke_refresh_token(&user_id).await?;

        self.issue_tokens(&user).await
    }
}

#[async_trait]
impl<D, S, M> AuthServicePort for AuthService<D, S, M>
where
    D: UserDirectory,
    S: SessionStore,
    M: Mailer,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, AuthError> {
        if let Some(existing) = self.directory.find_by_email(command.email.as_str()).await? {
            return Err(AuthError::DuplicateEmail(
                existing.email.as_str().to_string(),
            ));
        }

        // Hash password using the security library
        let hashed_password = self
            .password_hasher
            .hash(&command.password)
            .map_err(|e| AuthError::Unknown(format!("Password hashing failed: {}", e)))?;

        let user = User {
            id: UserId::new(),
            name: command.name,
            surname: command.surname,
            email: command.email,
            hashed_password,
            age: None,
            phone: command.phone,
            role: UserRole::User,
            disabled: false,
            reset_token: None,
            reset_token_expires: None,
        };

        self.directory.create(user).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .directory
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.password_hasher.verify(password, &user.hashed_password) {
            return Err(AuthError::InvalidCredentials);
        }

        // A disabled account is only reported as such for correct credentials.
        if user.disabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let subject = user.id.to_string();

        let access_token = self
            .codec
            .issue(&subject, self.access_ttl)
            .map_err(|e| AuthError::Unknown(format!("Token signing failed: {}", e)))?;
        let refresh_token = self
            .codec
            .issue(&subject, self.refresh_ttl)
            .map_err(|e| AuthError::Unknown(format!("Token signing failed: {}", e)))?;

        self.sessions
            .store_refresh_token(&user.id, &refresh_token)
            .await?;
        self.sessions
            .store_session(&user.id, &SessionData::for_login(user))
            .await?;

        Ok(TokenPair::bearer(access_token, refresh_token))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // Every rejection surfaces as InvalidToken; the real cause is logged.
        self.refresh_inner(refresh_token).await.map_err(|err| {
            if !matches!(err, AuthError::InvalidToken) {
                tracing::warn!("Refresh rejected: {}", err);
            }
            AuthError::InvalidToken
        })
    }

    async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let user = match self.directory.find_by_email(email).await? {
            Some(user) => user,
            None => return Ok(RESET_REQUEST_ACK.to_string()),
        };

        let ttl = Duration::hours(1);
        let reset_token = self
            .codec
            .issue(user.email.as_str(), ttl)
            .map_err(|e| AuthError::Unknown(format!("Token signing failed: {}", e)))?;

        let update = UserUpdate {
            reset_token: Some(Some(reset_token.clone())),
            reset_token_expires: Some(Some(Utc::now() + ttl)),
            ..Default::default()
        };

        if self.directory.update(&user.id, update).await?.is_none() {
            tracing::warn!("User {} disappeared during password reset request", user.id);
            return Ok(RESET_REQUEST_ACK.to_string());
        }

        if let Err(e) = self
            .mailer
            .send_reset_email(&user.email, &reset_token)
            .await
        {
            tracing::error!(
                "Failed to send password reset email to {}: {}",
                user.email.as_str(),
                e
            );
        }

        Ok(RESET_REQUEST_ACK.to_string())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError> {
        let email = self
            .codec
            .verify(token)
            .map_err(|_| AuthError::InvalidResetToken)?;

        let user = self
            .directory
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        // Only the most recently issued reset token is accepted, and only once.
        if user.reset_token.as_deref() != Some(token) {
            return Err(AuthError::InvalidResetToken);
        }

        if let Some(expires_at) = user.reset_token_expires {
            if expires_at < Utc::now() {
                return Err(AuthError::InvalidResetToken);
            }
        }

        let hashed_password = self
            .password_hasher
            .hash(new_password)
            .map_err(|e| AuthError::Unknown(format!("Password hashing failed: {}", e)))?;

        let update = UserUpdate {
            hashed_password: Some(hashed_password),
            reset_token: Some(None),
            reset_token_expires: Some(None),
        };

        self.directory
            .update(&user.id, update)
            .await?
            .ok_or(AuthError::NotFound(user.id.to_string()))?;

        Ok(PASSWORD_RESET_OK.to_string())
    }

    async fn logout(&self, user_id: &UserId, access_token: &str) -> Result<String, AuthError> {
        // A token that no longer decodes has nothing to blacklist.
        if let Ok(expiry) = self.codec.peek_expiry(access_token) {
            if let Some(expires_at) = DateTime::from_timestamp(expiry, 0) {
                self.sessions
                    .store_blacklisted(access_token, expires_at)
                    .await?;
            }
        }

        self.sessions.revoke_session(user_id).await?;

        Ok(LOGOUT_OK.to_string())
    }

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let user_id = self.verified_user_id(access_token).await?;

        let user = self
            .directory
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.disabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::auth::errors::MailerError;
    use crate::auth::errors::SessionStoreError;
    use crate::auth::models::EmailAddress;

    // Define mocks in the test module using mockall
    mock! {
        pub TestUserDirectory {}

        #[async_trait]
        impl UserDirectory for TestUserDirectory {
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
            async fn create(&self, user: User) -> Result<User, AuthError>;
            async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>, AuthError>;
        }
    }

    mock! {
        pub TestSessionStore {}

        #[async_trait]
        impl SessionStore for TestSessionStore {
            async fn store_refresh_token(&self, user_id: &UserId, token: &str) -> Result<(), SessionStoreError>;
            async fn get_refresh_token(&self, user_id: &UserId) -> Result<Option<String>, SessionStoreError>;
            async fn revoke_refresh_token(&self, user_id: &UserId) -> Result<(), SessionStoreError>;
            async fn store_blacklisted(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), SessionStoreError>;
            async fn is_blacklisted(&self, token: &str) -> Result<bool, SessionStoreError>;
            async fn store_session(&self, user_id: &UserId, session: &SessionData) -> Result<(), SessionStoreError>;
            async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionData>, SessionStoreError>;
            async fn revoke_session(&self, user_id: &UserId) -> Result<(), SessionStoreError>;
        }
    }

    mock! {
        pub TestMailer {}

        #[async_trait]
        impl Mailer for TestMailer {
            async fn send_reset_email(&self, to: &EmailAddress, reset_token: &str) -> Result<(), MailerError>;
        }
    }

    const TEST_SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn codec() -> security::TokenCodec {
        security::TokenCodec::new(TEST_SECRET)
    }

    fn test_user() -> User {
        User {
            id: UserId::new(),
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            hashed_password: "$2b$12$placeholder_hash".to_string(),
            age: None,
            phone: None,
            role: UserRole::User,
            disabled: false,
            reset_token: None,
            reset_token_expires: None,
        }
    }

    fn service(
        directory: MockTestUserDirectory,
        sessions: MockTestSessionStore,
        mailer: MockTestMailer,
    ) -> AuthService<MockTestUserDirectory, MockTestSessionStore, MockTestMailer> {
        AuthService::new(
            Arc::new(directory),
            Arc::new(sessions),
            Arc::new(mailer),
            codec(),
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut directory = MockTestUserDirectory::new();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        directory
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "jane@example.com"
                    && user.hashed_password.starts_with("$2")
                    && user.role == UserRole::User
                    && !user.disabled
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let command = RegisterUserCommand {
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            password: "password123".to_string(),
            phone: None,
        };

        let result = service.register(command).await;
        assert!(result.is_ok());

        let user = result.unwrap();
        assert_eq!(user.email.as_str(), "jane@example.com");
        // Password is hashed with real bcrypt
        assert!(user.hashed_password.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut directory = MockTestUserDirectory::new();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(test_user())));
        directory.expect_create().times(0);

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let command = RegisterUserCommand {
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            password: "password123".to_string(),
            phone: None,
        };

        let result = service.register(command).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        user.hashed_password = security::PasswordHasher::new().hash("password123").unwrap();

        let returned_user = user.clone();
        directory
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.authenticate("jane@example.com", "password123").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        user.hashed_password = security::PasswordHasher::new().hash("password123").unwrap();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.authenticate("jane@example.com", "wrong-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let mut directory = MockTestUserDirectory::new();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.authenticate("nobody@example.com", "password123").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_disabled_account() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        user.hashed_password = security::PasswordHasher::new().hash("password123").unwrap();
        user.disabled = true;

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.authenticate("jane@example.com", "password123").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_authenticate_disabled_account_wrong_password() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        user.hashed_password = security::PasswordHasher::new().hash("password123").unwrap();
        user.disabled = true;

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        // Wrong credentials win over the disabled state
        let result = service.authenticate("jane@example.com", "wrong-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_issue_tokens_persists_refresh_and_session() {
        let mut sessions = MockTestSessionStore::new();

        let user = test_user();
        let user_id = user.id;

        sessions
            .expect_store_refresh_token()
            .withf(move |id, _| *id == user_id)
            .times(1)
            .returning(|_, _| Ok(()));
        sessions
            .expect_store_session()
            .withf(move |id, session| *id == user_id && session.user_id == user_id.to_string())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.issue_tokens(&user).await;
        assert!(result.is_ok());

        let pair = result.unwrap();
        assert_eq!(pair.token_type, "bearer");
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(codec().verify(&pair.access_token).unwrap(), user_id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let mut directory = MockTestUserDirectory::new();
        let mut sessions = MockTestSessionStore::new();

        let user = test_user();
        let user_id = user.id;
        // A shorter lifetime than freshly issued tokens, as if issued earlier
        let old_token = codec()
            .issue(&user_id.to_string(), Duration::days(6))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        let stored_token = old_token.clone();
        sessions
            .expect_get_refresh_token()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(stored_token.clone())));
        sessions
            .expect_revoke_refresh_token()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(()));
        sessions
            .expect_store_refresh_token()
            .times(1)
            .returning(|_, _| Ok(()));
        sessions
            .expect_store_session()
            .times(1)
            .returning(|_, _| Ok(()));

        directory
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, sessions, MockTestMailer::new());

        let result = service.refresh(&old_token).await;
        assert!(result.is_ok());

        let pair = result.unwrap();
        assert_ne!(pair.refresh_token, old_token);
        assert_eq!(codec().verify(&pair.refresh_token).unwrap(), user_id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rejects_token_without_session() {
        let mut sessions = MockTestSessionStore::new();

        let token = codec()
            .issue(&UserId::new().to_string(), Duration::days(7))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        sessions
            .expect_get_refresh_token()
            .times(1)
            .returning(|_| Ok(None));
        sessions.expect_revoke_refresh_token().times(0);

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.refresh(&token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_rotated_out_token() {
        let mut sessions = MockTestSessionStore::new();

        let user_id = UserId::new();
        let presented = codec().issue(&user_id.to_string(), Duration::days(6)).unwrap();
        let current = codec().issue(&user_id.to_string(), Duration::days(7)).unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        sessions
            .expect_get_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(current.clone())));
        sessions.expect_revoke_refresh_token().times(0);

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.refresh(&presented).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token() {
        let mut sessions = MockTestSessionStore::new();

        // Past the default 60s verification leeway
        let expired = codec()
            .issue(&UserId::new().to_string(), Duration::minutes(-2))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        sessions.expect_get_refresh_token().times(0);

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.refresh(&expired).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_blacklisted_token() {
        let mut sessions = MockTestSessionStore::new();

        let token = codec()
            .issue(&UserId::new().to_string(), Duration::days(7))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(true));
        sessions.expect_get_refresh_token().times(0);

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.refresh(&token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_collapses_store_failure_to_invalid_token() {
        let mut sessions = MockTestSessionStore::new();

        let token = codec()
            .issue(&UserId::new().to_string(), Duration::days(7))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Err(SessionStoreError::Unavailable("connection refused".to_string())));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.refresh(&token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_user() {
        let mut directory = MockTestUserDirectory::new();
        let mut sessions = MockTestSessionStore::new();

        let user_id = UserId::new();
        let token = codec().issue(&user_id.to_string(), Duration::days(7)).unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        let stored_token = token.clone();
        sessions
            .expect_get_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(stored_token.clone())));
        sessions.expect_revoke_refresh_token().times(0);

        directory
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(directory, sessions, MockTestMailer::new());

        let result = service.refresh(&token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_reset_request_known_email() {
        let mut directory = MockTestUserDirectory::new();
        let mut mailer = MockTestMailer::new();

        let user = test_user();
        let user_id = user.id;
        let email = user.email.clone();

        let returned_user = user.clone();
        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));
        let updated_user = user.clone();
        directory
            .expect_update()
            .withf(move |id, update| {
                *id == user_id
                    && matches!(update.reset_token, Some(Some(_)))
                    && matches!(update.reset_token_expires, Some(Some(_)))
                    && update.hashed_password.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(Some(updated_user.clone())));

        mailer
            .expect_send_reset_email()
            .withf(move |to, token| *to == email && !token.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(directory, MockTestSessionStore::new(), mailer);

        let result = service.request_password_reset("jane@example.com").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), RESET_REQUEST_ACK);
    }

    #[tokio::test]
    async fn test_reset_request_unknown_email() {
        let mut directory = MockTestUserDirectory::new();
        let mut mailer = MockTestMailer::new();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        directory.expect_update().times(0);
        mailer.expect_send_reset_email().times(0);

        let service = service(directory, MockTestSessionStore::new(), mailer);

        // Same acknowledgement as for a registered address
        let result = service.request_password_reset("nobody@example.com").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), RESET_REQUEST_ACK);
    }

    #[tokio::test]
    async fn test_reset_request_mailer_failure_still_acks() {
        let mut directory = MockTestUserDirectory::new();
        let mut mailer = MockTestMailer::new();

        let user = test_user();
        let returned_user = user.clone();
        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));
        let updated_user = user.clone();
        directory
            .expect_update()
            .times(1)
            .returning(move |_, _| Ok(Some(updated_user.clone())));

        mailer
            .expect_send_reset_email()
            .times(1)
            .returning(|_, _| Err(MailerError::SendFailed("relay down".to_string())));

        let service = service(directory, MockTestSessionStore::new(), mailer);

        let result = service.request_password_reset("jane@example.com").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), RESET_REQUEST_ACK);
    }

    #[tokio::test]
    async fn test_reset_password_success() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        let token = codec().issue(user.email.as_str(), Duration::hours(1)).unwrap();
        user.reset_token = Some(token.clone());
        user.reset_token_expires = Some(Utc::now() + Duration::hours(1));
        let user_id = user.id;

        let returned_user = user.clone();
        directory
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));
        let updated_user = user.clone();
        directory
            .expect_update()
            .withf(move |id, update| {
                *id == user_id
                    && update
                        .hashed_password
                        .as_deref()
                        .is_some_and(|hash| hash.starts_with("$2"))
                    && update.reset_token == Some(None)
                    && update.reset_token_expires == Some(None)
            })
            .times(1)
            .returning(move |_, _| Ok(Some(updated_user.clone())));

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.reset_password(&token, "new-password").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), PASSWORD_RESET_OK);
    }

    #[tokio::test]
    async fn test_reset_password_rejects_reused_token() {
        let mut directory = MockTestUserDirectory::new();

        // The stored token was cleared by a previous reset
        let user = test_user();
        let token = codec().issue(user.email.as_str(), Duration::hours(1)).unwrap();

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        directory.expect_update().times(0);

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.reset_password(&token, "new-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_superseded_token() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        let presented = codec()
            .issue(user.email.as_str(), Duration::minutes(30))
            .unwrap();
        let latest = codec().issue(user.email.as_str(), Duration::hours(1)).unwrap();
        user.reset_token = Some(latest);
        user.reset_token_expires = Some(Utc::now() + Duration::hours(1));

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        directory.expect_update().times(0);

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.reset_password(&presented, "new-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_stale_expiry() {
        let mut directory = MockTestUserDirectory::new();

        let mut user = test_user();
        let token = codec().issue(user.email.as_str(), Duration::hours(1)).unwrap();
        user.reset_token = Some(token.clone());
        user.reset_token_expires = Some(Utc::now() - Duration::hours(2));

        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        directory.expect_update().times(0);

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.reset_password(&token, "new-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_garbage_token() {
        let mut directory = MockTestUserDirectory::new();

        directory.expect_find_by_email().times(0);
        directory.expect_update().times(0);

        let service = service(directory, MockTestSessionStore::new(), MockTestMailer::new());

        let result = service.reset_password("not.a.token", "new-password").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_logout_blacklists_access_token() {
        let mut sessions = MockTestSessionStore::new();

        let user_id = UserId::new();
        let access_token = codec()
            .issue(&user_id.to_string(), Duration::minutes(30))
            .unwrap();

        let expected_token = access_token.clone();
        sessions
            .expect_store_blacklisted()
            .withf(move |token, expires_at| {
                token == expected_token && *expires_at > Utc::now()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        sessions
            .expect_revoke_session()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.logout(&user_id, &access_token).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), LOGOUT_OK);
    }

    #[tokio::test]
    async fn test_logout_skips_blacklist_for_undecodable_token() {
        let mut sessions = MockTestSessionStore::new();

        let user_id = UserId::new();

        sessions.expect_store_blacklisted().times(0);
        sessions
            .expect_revoke_session()
            .times(1)
            .returning(|_| Ok(()));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.logout(&user_id, "not.a.token").await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), LOGOUT_OK);
    }

    #[tokio::test]
    async fn test_current_user_success() {
        let mut directory = MockTestUserDirectory::new();
        let mut sessions = MockTestSessionStore::new();

        let user = test_user();
        let user_id = user.id;
        let access_token = codec()
            .issue(&user_id.to_string(), Duration::minutes(30))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        directory
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, sessions, MockTestMailer::new());

        let result = service.current_user(&access_token).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().id, user_id);
    }

    #[tokio::test]
    async fn test_current_user_rejects_blacklisted_token() {
        let mut sessions = MockTestSessionStore::new();

        let access_token = codec()
            .issue(&UserId::new().to_string(), Duration::minutes(30))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(true));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.current_user(&access_token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_current_user_rejects_disabled_account() {
        let mut directory = MockTestUserDirectory::new();
        let mut sessions = MockTestSessionStore::new();

        let mut user = test_user();
        user.disabled = true;
        let access_token = codec()
            .issue(&user.id.to_string(), Duration::minutes(30))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Ok(false));
        directory
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(directory, sessions, MockTestMailer::new());

        let result = service.current_user(&access_token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_current_user_propagates_store_failure() {
        let mut sessions = MockTestSessionStore::new();

        let access_token = codec()
            .issue(&UserId::new().to_string(), Duration::minutes(30))
            .unwrap();

        sessions
            .expect_is_blacklisted()
            .times(1)
            .returning(|_| Err(SessionStoreError::Unavailable("connection refused".to_string())));

        let service = service(MockTestUserDirectory::new(), sessions, MockTestMailer::new());

        let result = service.current_user(&access_token).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AuthError::StoreUnavailable(_)));
    }
}
