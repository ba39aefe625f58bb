//! Domain service for nutrition lookups and the per-user search history.

use serde_json::Value;
use thiserror::Error;

use crate::models::User;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The nutrition API failed, timed out, or returned garbage.
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    /// Looks up `food` for `user` and records the lookup in their history.
    ///
    /// Nothing is recorded when the lookup fails. Once the lookup succeeds the
    /// payload is returned even if recording it fails.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Upstream`] if the nutrition API call fails.
    async fn search(&self, user: &User, food: &str) -> Result<Value, SearchError>;
}
