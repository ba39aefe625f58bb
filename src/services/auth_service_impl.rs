//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::db::{CreateUserOutcome, Store};
use crate::models::User;
use crate::services::auth_service::{AuthError, AuthService, GoogleLoginResult, LoginResult};
use crate::services::token_service::TokenService;
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn create_account(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        match self
            .store
            .create_user(username, password, &self.security)
            .await?
        {
            CreateUserOutcome::Created(user) => {
                tracing::info!(username = %user.username, "Account created");
                Ok(user)
            }
            CreateUserOutcome::UsernameTaken => Err(AuthError::Conflict),
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let username = self
            .store
            .verify_credentials(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self
            .tokens
            .issue(&username)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(LoginResult { token, username })
    }

    async fn google_login(&self, external_token: &str) -> Result<GoogleLoginResult, AuthError> {
        if external_token.is_empty() {
            return Err(AuthError::Validation("Token is required".to_string()));
        }

        let user = self.store.find_or_create_google_user(external_token).await?;

        Ok(GoogleLoginResult {
            token: external_token.to_string(),
            username: user.username,
        })
    }

    async fn authenticate(&self, bearer: Option<&str>) -> Result<User, AuthError> {
        let token = bearer.ok_or(AuthError::Unauthenticated)?;

        let username = self.tokens.verify(token).map_err(|_| AuthError::Forbidden)?;

        self.store
            .find_user_by_username(&username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
