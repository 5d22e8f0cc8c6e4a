//! Registration and login.

use std::sync::Arc;

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, info};

use crate::database::models::NewUser;
use crate::database::repositories::UserRepository;
use crate::domain::AuthUser;

use super::jwt::{JwtError, JwtService};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] crate::Error),

    #[error("{0}")]
    Internal(String),
}

/// Issued on successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: AuthUser,
    pub token: String,
    pub expires_in: u64,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_service: Arc<JwtService>) -> Self {
        Self { users, jwt_service }
    }

    /// Create an account. Input shape has already been validated.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        if self.users.exists_by_email(email).await? {
            debug!("Registration refused, email already in use");
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .users
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: Self::hash_password(password)?,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with another registration, or the username is taken.
                crate::Error::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        info!(user_id = user.id, "User registered");
        Ok(AuthUser::from(&user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = AuthUser::from(&user);
        let token = self.jwt_service.generate_token(&user)?;
        info!(user_id = user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            token,
            expires_in: self.jwt_service.expiration_secs(),
        })
    }

    /// Hash a password using Argon2id (m=19 MiB, t=2, p=1).
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let params = Params::new(19456, 2, 1, None)
            .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read from the hash itself
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::SqlxUserRepository;
    use crate::database::test_utils::setup_test_pool;

    async fn service() -> AuthService {
        let pool = setup_test_pool().await;
        AuthService::new(
            Arc::new(SqlxUserRepository::new(pool)),
            Arc::new(JwtService::new("test-secret-key-32-chars-long!!", "iss", "aud", None)),
        )
    }

    #[test]
    fn test_hash_password_is_argon2id() {
        let hash = AuthService::hash_password("testpassword123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(AuthService::verify_password("testpassword123", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service().await;
        let user = auth.register("alice", "alice@example.com", "hunter22").await.unwrap();

        let outcome = auth.login("alice@example.com", "hunter22").await.unwrap();

        assert_eq!(outcome.user, user);
        assert!(!outcome.token.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let auth = service().await;
        auth.register("alice", "alice@example.com", "hunter22").await.unwrap();

        let err = auth
            .register("alice2", "alice@example.com", "hunter22")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let auth = service().await;
        auth.register("alice", "alice@example.com", "hunter22").await.unwrap();

        assert!(matches!(
            auth.login("alice@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
