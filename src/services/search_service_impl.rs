//! Default `SearchService` backed by a `NutritionLookup` and the `Store`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::clients::NutritionLookup;
use crate::db::Store;
use crate::models::{SearchHistoryEntry, User};
use crate::services::search_service::{SearchError, SearchService};

const NUTRITION_SERVICE: &str = "Nutrition API";

pub struct DefaultSearchService {
    store: Store,
    lookup: Arc<dyn NutritionLookup>,
}

impl DefaultSearchService {
    #[must_use]
    pub fn new(store: Store, lookup: Arc<dyn NutritionLookup>) -> Self {
        Self { store, lookup }
    }
}

#[async_trait]
impl SearchService for DefaultSearchService {
    async fn search(&self, user: &User, food: &str) -> Result<Value, SearchError> {
        if food.trim().is_empty() {
            return Err(SearchError::Validation("Food name cannot be empty".to_string()));
        }

        let payload = self
            .lookup
            .lookup(food)
            .await
            .map_err(|e| SearchError::Upstream {
                service: NUTRITION_SERVICE.to_string(),
                message: format!("{e:#}"),
            })?;

        let entry = SearchHistoryEntry::from_payload(food, &payload);

        match self.store.append_search_history(user, &entry).await {
            Ok(updated) => info!(
                username = %updated.username,
                food = %food,
                history_len = updated.search_history.len(),
                "Recorded search"
            ),
            Err(e) => error!(
                username = %user.username,
                food = %food,
                "Failed to record search history: {e:#}"
            ),
        }

        Ok(payload)
    }
}
