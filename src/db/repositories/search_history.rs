use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::search_history;
use crate::models::SearchHistoryEntry;

pub struct SearchHistoryRepository {
    conn: DatabaseConnection,
}

impl SearchHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Appends one entry with a single INSERT. Earlier rows are never touched,
    /// so concurrent appends for the same user cannot overwrite each other.
    pub async fn append(&self, user_id: i32, entry: &SearchHistoryEntry) -> Result<()> {
        let response_json =
            serde_json::to_string(&entry.response).context("Failed to encode search response")?;

        search_history::ActiveModel {
            user_id: Set(user_id),
            food: Set(entry.food.clone()),
            response_json: Set(response_json),
            created_at: Set(entry.searched_at.clone()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to append search history entry")?;

        Ok(())
    }

    /// All entries for a user in insertion order.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<SearchHistoryEntry>> {
        let rows = search_history::Entity::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_asc(search_history::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query search history")?;

        rows.into_iter()
            .map(|row| {
                let response = serde_json::from_str(&row.response_json).with_context(|| {
                    format!("Corrupt search history entry {} for user {user_id}", row.id)
                })?;

                Ok(SearchHistoryEntry {
                    food: row.food,
                    response,
                    searched_at: row.created_at,
                })
            })
            .collect()
    }
}
