use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::NutritionLookup;
use crate::config::NutritionConfig;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Client for the `CalorieNinjas` nutrition API.
#[derive(Clone)]
pub struct CalorieNinjasClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CalorieNinjasClient {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &NutritionConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// `{base}/v1/nutrition?query=<food>`, with the food name percent-encoded.
    pub fn nutrition_url(&self, food: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid nutrition API base URL: {}", self.base_url))?
            .join("v1/nutrition")
            .context("Failed to build nutrition API URL")?;

        url.query_pairs_mut().append_pair("query", food);
        Ok(url)
    }
}

#[async_trait]
impl NutritionLookup for CalorieNinjasClient {
    async fn lookup(&self, food: &str) -> Result<Value> {
        let url = self.nutrition_url(food)?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Nutrition API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Nutrition API error: {} - {}", status, body));
        }

        response
            .json::<Value>()
            .await
            .context("Nutrition API returned invalid JSON")
    }
}
