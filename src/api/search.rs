use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SearchHistoryResponse, auth::AuthenticatedUser};
use crate::services::SearchError;

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => Self::validation(msg),
            SearchError::Upstream { service, message } => {
                Self::ExternalApiError { service, message }
            }
            SearchError::Database(msg) => Self::internal(msg),
        }
    }
}

/// The gate always attaches a user; its absence is a wiring bug.
fn require_user(user: Option<Extension<AuthenticatedUser>>) -> Result<AuthenticatedUser, ApiError> {
    user.map(|Extension(user)| user).ok_or_else(|| {
        ApiError::internal("Authenticated user missing from request context")
            .with_public_message("User data not found")
    })
}

/// GET /api/{food}
/// Proxies the nutrition lookup and records it in the caller's history.
pub async fn search_food(
    State(state): State<Arc<AppState>>,
    Path(food): Path<String>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<Value>, ApiError> {
    let AuthenticatedUser(user) = require_user(user)?;

    let payload = state.search_service().search(&user, &food).await?;

    Ok(Json(payload))
}

/// GET /api/search-history
pub async fn search_history(
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<SearchHistoryResponse>, ApiError> {
    let AuthenticatedUser(user) = require_user(user)
        .map_err(|e| e.with_public_message("An error occurred while fetching search history"))?;

    Ok(Json(ApiResponse::success(user.search_history)))
}
