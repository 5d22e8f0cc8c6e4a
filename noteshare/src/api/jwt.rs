//! JWT token generation and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::config::JwtSettings;
use crate::domain::AuthUser;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID (subject)
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Token issuer
    pub iss: String,
    /// Token audience
    pub aud: String,
    /// Expiration timestamp (Unix)
    pub exp: u64,
    /// Issued at timestamp (Unix)
    pub iat: u64,
}

impl Claims {
    /// The identity carried by the token.
    pub fn auth_user(&self) -> Result<AuthUser, JwtError> {
        let id = self.sub.parse().map_err(|_| JwtError::MissingClaims)?;
        Ok(AuthUser {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
        })
    }
}

/// JWT service error types.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
    #[error("Token validation failed: {0}")]
    TokenValidation(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Missing claims")]
    MissingClaims,
}

/// HS256 signer/verifier.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_secs: u64,
}

impl JwtService {
    /// `expiration_secs` defaults to one day.
    pub fn new(secret: &str, issuer: &str, audience: &str, expiration_secs: Option<u64>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiration_secs: expiration_secs.unwrap_or(86_400),
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Self {
        info!(
            "JWT service initialized (issuer: {}, audience: {}, expiration: {}s)",
            settings.issuer, settings.audience, settings.expiration_secs
        );

        Self::new(
            &settings.secret,
            &settings.issuer,
            &settings.audience,
            Some(settings.expiration_secs),
        )
    }

    pub fn expiration_secs(&self) -> u64 {
        self.expiration_secs
    }

    /// Issue a token for `user`.
    pub fn generate_token(&self, user: &AuthUser) -> Result<String, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: now + self.expiration_secs,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::TokenValidation(e.to_string()),
            })
    }

    /// Validate and resolve straight to the caller's identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, JwtError> {
        self.validate_token(token)?.auth_user()
    }
}
