pub mod calorie_ninjas;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use calorie_ninjas::CalorieNinjasClient;

/// Looks up nutrition facts for a free-text food query and returns the raw
/// upstream payload.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn lookup(&self, food: &str) -> Result<Value>;
}
