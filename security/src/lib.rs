//! Credential and token primitives
//!
//! Provides the cryptographic building blocks for the account service:
//! - Password hashing (bcrypt, with its 72-byte input limit handled explicitly)
//! - Signed expiring tokens (JWT) for access, refresh, and password-reset flows
//!
//! The service layer owns all session policy (rotation, revocation, single-use
//! reset tokens); this crate only hashes, signs, and verifies.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use security::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! assert!(!hasher.verify("wrong_password", &digest));
//! ```
//!
//! ## Tokens
//! ```
//! use chrono::Duration;
//! use security::TokenCodec;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec.issue("user123", Duration::minutes(30)).unwrap();
//! let subject = codec.verify(&token).unwrap();
//! assert_eq!(subject, "user123");
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::MAX_PASSWORD_BYTES;
