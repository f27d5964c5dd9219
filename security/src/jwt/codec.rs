use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Signs and verifies JWTs with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Creates a new codec from a shared secret.
    ///
    /// # Arguments
    ///
    /// * `secret` - Secret bytes used for both signing and verification
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issues a signed token for `subject` expiring `ttl` from now.
    ///
    /// # Arguments
    ///
    /// * `subject` - Identifier stored in the token's `sub` claim
    /// * `ttl` - Lifetime of the token
    ///
    /// # Returns
    ///
    /// The encoded token string.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EncodingFailed` if signing fails.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(subject, ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verifies a token's signature and expiry and returns its subject.
    ///
    /// # Arguments
    ///
    /// * `token` - The encoded token string
    ///
    /// # Returns
    ///
    /// The `sub` claim of a valid token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for expired tokens and
    /// `TokenError::Invalid` for any other verification failure.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let validation = Validation::new(self.algorithm);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                if e.to_string().contains("ExpiredSignature") {
                    TokenError::Expired
                } else {
                    TokenError::Invalid(e.to_string())
                }
            })
    }

    /// Reads a token's expiry timestamp without requiring it to be current.
    ///
    /// The signature is still checked. Revocation uses this to compute how
    /// long a token must stay blacklisted, so already-expired tokens decode
    /// successfully here.
    ///
    /// # Arguments
    ///
    /// * `token` - The encoded token string
    ///
    /// # Returns
    ///
    /// The `exp` claim as a unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token cannot be decoded.
    pub fn peek_expiry(&self, token: &str) -> Result<i64, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.exp)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret")
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = codec();

        let token = codec.issue("user-id", Duration::minutes(30)).unwrap();
        let subject = codec.verify(&token).unwrap();

        assert_eq!(subject, "user-id");
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        let token = codec().issue("user-id", Duration::minutes(30)).unwrap();

        let result = TokenCodec::new(b"other-secret").verify(&token);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let result = codec().verify("not.a.token");

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let codec = codec();

        // Past the default 60s leeway.
        let token = codec.issue("user-id", Duration::minutes(-2)).unwrap();
        let result = codec.verify(&token);

        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_peek_expiry_reads_expired_token() {
        let codec = codec();

        let token = codec.issue("user-id", Duration::minutes(-2)).unwrap();
        let expiry = codec.peek_expiry(&token).unwrap();

        let expected = (Utc::now() + Duration::minutes(-2)).timestamp();
        assert!((expiry - expected).abs() <= 1);
    }

    #[test]
    fn test_peek_expiry_rejects_garbage() {
        let result = codec().peek_expiry("not.a.token");

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_peek_expiry_rejects_foreign_signature() {
        let token = codec().issue("user-id", Duration::minutes(30)).unwrap();

        let result = TokenCodec::new(b"other-secret").peek_expiry(&token);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }
}
