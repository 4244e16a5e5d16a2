//! Shared-secret token handling
//!
//! HS256 tokens signed with a local secret. Used in dev mode in place of the
//! Firebase verifier, and by tests to mint identities.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Default expiry is 1 hour
//! - Outside dev mode JWT_SECRET should be a strong random value

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{Identity, IdentityVerifier};
use crate::types::{LecternError, Result};

/// Payload stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// HS256 verifier and generator
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
    expiry_seconds: u64,
}

impl JwtVerifier {
    /// Create a new verifier
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(LecternError::Config("JWT_SECRET must not be empty".into()));
        }

        if secret.len() < 32 {
            return Err(LecternError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Generate a token for a user
    pub fn generate_token(&self, uid: &str, email: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| LecternError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: uid.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LecternError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a token
    pub fn decode_claims(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let claims = self.decode_claims(token)?;

        if claims.sub.is_empty() {
            return Err(LecternError::InvalidToken("Token has no subject".into()));
        }

        Ok(Identity {
            uid: claims.sub,
            email: claims.email,
        })
    }
}
