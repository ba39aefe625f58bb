//! Domain service for accounts, logins and bearer-token resolution.

use serde::Serialize;
use thiserror::Error;

use crate::models::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("You are not authenticated")]
    Unauthenticated,

    /// The presented token is expired or tampered with.
    #[error("Token is invalid")]
    Forbidden,

    /// The token is valid but its user no longer exists.
    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken")]
    Conflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Issued bearer token and the username it is bound to.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub username: String,
}

/// Result of exchanging a Google token for a local account.
#[derive(Debug, Clone)]
pub struct GoogleLoginResult {
    /// The external token, echoed back unchanged.
    pub token: String,
    pub username: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Registers a local account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the username is taken.
    async fn create_account(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Checks local credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the user is unknown or the
    /// password does not match.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Finds or creates the account linked to an already-verified Google token.
    async fn google_login(&self, external_token: &str) -> Result<GoogleLoginResult, AuthError>;

    /// Resolves a presented bearer token to the full user record.
    ///
    /// `None` means no token was presented.
    async fn authenticate(&self, bearer: Option<&str>) -> Result<User, AuthError>;
}
