use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user account with its full search history, oldest entry first.
/// The password hash never leaves the repository layer. Not serializable, so
/// `google_token` cannot end up in a response body.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,

    pub username: String,

    pub google_token: Option<String>,

    pub search_history: Vec<SearchHistoryEntry>,

    pub created_at: String,

    pub updated_at: String,
}

/// Username prefix for accounts created by Google login.
pub const GOOGLE_USERNAME_PREFIX: &str = "google-";

/// One past lookup and the items it returned. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHistoryEntry {
    pub food: String,

    pub response: Value,

    #[serde(default)]
    pub searched_at: String,
}

impl SearchHistoryEntry {
    /// Builds an entry keeping only the `items` of an upstream payload.
    #[must_use]
    pub fn from_payload(food: &str, payload: &Value) -> Self {
        let items = payload
            .get("items")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        Self {
            food: food.to_string(),
            response: serde_json::json!({ "items": items }),
            searched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
