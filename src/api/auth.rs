use axum::{
    Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, AppState, CredentialsRequest, GoogleLoginRequest, GoogleLoginResponse,
    LoginResponse, MessageResponse,
};
use crate::models::User;
use crate::services::AuthError;

/// Session key holding the username of a Google-linked account.
pub const SESSION_USER_KEY: &str = "user";

/// The user resolved by [`require_bearer`], attached to the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// What [`require_bearer`] decided, left on the response for request logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Admitted { username: String },
    Rejected(&'static str),
}

impl GateOutcome {
    fn rejected(err: &AuthError) -> Self {
        Self::Rejected(match err {
            AuthError::Unauthenticated => "missing_token",
            AuthError::Forbidden => "invalid_token",
            AuthError::UserNotFound => "unknown_user",
            _ => "error",
        })
    }

    /// Metrics label: `admitted` or the rejection reason.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "admitted",
            Self::Rejected(reason) => reason,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::Forbidden => Self::Forbidden,
            AuthError::UserNotFound => Self::user_not_found(),
            AuthError::Conflict => Self::Conflict("Username already taken".to_string()),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) | AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to a full user record.
///
/// Every request re-verifies the token and re-reads the user; nothing is
/// cached between requests.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = extract_bearer(request.headers());

    let user = match state.auth_service().authenticate(bearer.as_deref()).await {
        Ok(user) => user,
        Err(err) => {
            let outcome = GateOutcome::rejected(&err);
            let mut response = ApiError::from(err).into_response();
            response.extensions_mut().insert(outcome);
            return response;
        }
    };

    let username = user.username.clone();
    tracing::Span::current().record("user_id", username.as_str());
    request.extensions_mut().insert(AuthenticatedUser(user));

    let mut response = next.run(request).await;
    response
        .extensions_mut()
        .insert(GateOutcome::Admitted { username });
    response
}

/// `None` when the header is absent. A header without a second word yields
/// an empty token, which fails verification rather than authentication.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?;
    let value = value.to_str().unwrap_or_default();

    Some(
        value
            .split_once(' ')
            .map_or("", |(_, token)| token.trim())
            .to_string(),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /create-account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    state
        .auth_service()
        .create_account(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::from(e).with_public_message("An error occurred. Please try again."))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "Account created successfully".to_string(),
        }),
    ))
}

/// POST /login
/// Checks username and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!(username = %payload.username, "Rejected login");
            }
            ApiError::from(e).with_public_message("An error occurred during login")
        })?;

    Ok(Json(LoginResponse {
        token: result.token,
        username: result.username,
    }))
}

/// POST /google-login
/// The token is assumed to be verified by the OAuth collaborator; it is linked
/// to an account, remembered in the session, and echoed back.
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> Result<Json<GoogleLoginResponse>, ApiError> {
    let Json(payload) = payload?;

    let result = state
        .auth_service()
        .google_login(&payload.token)
        .await
        .map_err(|e| ApiError::from(e).with_public_message("An error occurred during login"))?;

    session
        .insert(SESSION_USER_KEY, &result.username)
        .await
        .map_err(|e| {
            ApiError::internal(format!("Failed to create session: {e}"))
                .with_public_message("An error occurred during login")
        })?;

    Ok(Json(GoogleLoginResponse {
        token: result.token,
    }))
}
