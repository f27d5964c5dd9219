use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::auth::models::SessionData;
use crate::domain::auth::models::UserId;
use crate::domain::auth::ports::SessionStore;
use crate::auth::errors::SessionStoreError;

/// Session state backed by Redis.
///
/// Key layout:
/// * `refresh_token:{user_id}` - JSON envelope holding the current refresh token
/// * `blacklist:{token}` - marker for revoked access tokens
/// * `session:{user_id}` - JSON session snapshot
///
/// Refresh token and session keys expire with the refresh token lifetime;
/// blacklist keys expire when the token they mark would have expired anyway.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
    refresh_ttl_seconds: u64,
}

/// Stored envelope for the current refresh token.
#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenRecord {
    token: String,
    created_at: DateTime<Utc>,
    user_id: String,
}

impl RedisSessionStore {
    /// Connect to Redis and return a store handle.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL
    /// * `refresh_ttl_seconds` - Expiry applied to refresh token and session keys
    ///
    /// # Errors
    /// * `Unavailable` - Redis could not be reached
    pub async fn connect(url: &str, refresh_ttl_seconds: u64) -> Result<Self, SessionStoreError> {
        let client =
            Client::open(url).map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            connection,
            refresh_ttl_seconds,
        })
    }

    fn refresh_key(user_id: &UserId) -> String {
        format!("refresh_token:{}", user_id)
    }

    fn blacklist_key(token: &str) -> String {
        format!("blacklist:{}", token)
    }

    fn session_key(user_id: &UserId) -> String {
        format!("session:{}", user_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn store_refresh_token(
        &self,
        user_id: &UserId,
        token: &str,
    ) -> Result<(), SessionStoreError> {
        let record = RefreshTokenRecord {
            token: token.to_string(),
            created_at: Utc::now(),
            user_id: user_id.to_string(),
        };
        let payload = serde_json::to_string(&record)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;

        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(Self::refresh_key(user_id), payload, self.refresh_ttl_seconds)
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn get_refresh_token(
        &self,
        user_id: &UserId,
    ) -> Result<Option<String>, SessionStoreError> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn
            .get(Self::refresh_key(user_id))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        match payload {
            Some(payload) => {
                let record: RefreshTokenRecord = serde_json::from_str(&payload)
                    .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
                Ok(Some(record.token))
            }
            None => Ok(None),
        }
    }

    async fn revoke_refresh_token(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(Self::refresh_key(user_id))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn store_blacklisted(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionStoreError> {
        // A token past its expiry rejects itself
        let remaining = (expires_at - Utc::now()).num_seconds();
        if remaining <= 0 {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(Self::blacklist_key(token), "revoked", remaining as u64)
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, SessionStoreError> {
        let mut conn = self.connection.clone();
        let exists: bool = conn
            .exists(Self::blacklist_key(token))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(exists)
    }

    async fn store_session(
        &self,
        user_id: &UserId,
        session: &SessionData,
    ) -> Result<(), SessionStoreError> {
        let payload = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;

        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(Self::session_key(user_id), payload, self.refresh_ttl_seconds)
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn get_session(&self, user_id: &UserId) -> Result<Option<SessionData>, SessionStoreError> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn
            .get(Self::session_key(user_id))
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| SessionStoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn revoke_session(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(vec![Self::session_key(user_id), Self::refresh_key(user_id)])
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
