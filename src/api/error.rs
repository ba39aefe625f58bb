use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::{ConflictResponse, ErrorResponse};

/// Public body for internal failures without a route-specific message.
const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred";

#[derive(Debug)]
pub enum ApiError {
    /// No bearer token on a protected route.
    Unauthenticated,

    /// Bearer token expired or tampered with.
    Forbidden,

    NotFound(String),

    InvalidCredentials,

    Conflict(String),

    ValidationError(String),

    ExternalApiError { service: String, message: String },

    /// `public` is returned to the caller; `detail` is only logged.
    InternalError { public: String, detail: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::InternalError { detail, .. } => write!(f, "Internal error: {}", detail),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, Json("You are not authenticated")).into_response()
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, Json("Token is invalid")).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(msg)).into_response(),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid credentials")),
            )
                .into_response(),
            ApiError::Conflict(message) => (
                StatusCode::BAD_REQUEST,
                Json(ConflictResponse {
                    exists: true,
                    message,
                }),
            )
                .into_response(),
            ApiError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while fetching data",
                )
                    .into_response()
            }
            ApiError::InternalError { public, detail } => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(public)),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(format!("{err:#}"))
    }
}

impl ApiError {
    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::InternalError {
            public: GENERIC_INTERNAL_MESSAGE.to_string(),
            detail: detail.into(),
        }
    }

    /// Replaces the public message of an internal error, leaving every other
    /// variant untouched.
    #[must_use]
    pub fn with_public_message(self, public: &str) -> Self {
        match self {
            ApiError::InternalError { detail, .. } => ApiError::InternalError {
                public: public.to_string(),
                detail,
            },
            other => other,
        }
    }
}
