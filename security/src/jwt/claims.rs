use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Payload carried by every token the codec issues.
///
/// Access and refresh tokens carry the user id in `sub`; password-reset
/// tokens carry the account email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `subject` expiring `ttl` from now.
    pub fn new(subject: impl ToString, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        }
    }
}
