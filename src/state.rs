use std::sync::Arc;

use crate::clients::{CalorieNinjasClient, NutritionLookup};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, DefaultSearchService, SeaOrmAuthService, SearchService, TokenService,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("foodlog/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Process-wide dependencies, constructed once at start-up and handed to
/// every handler.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub auth_service: Arc<dyn AuthService>,

    pub search_service: Arc<dyn SearchService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client =
            build_shared_http_client(config.nutrition.request_timeout_seconds.into())?;
        let lookup = Arc::new(CalorieNinjasClient::with_shared_client(
            http_client,
            &config.nutrition,
        ));

        Self::with_nutrition_lookup(config, lookup).await
    }

    /// Builds the state around a caller-supplied nutrition lookup.
    pub async fn with_nutrition_lookup(
        config: Config,
        lookup: Arc<dyn NutritionLookup>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::from_config(&config.security));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let search_service = Arc::new(DefaultSearchService::new(store.clone(), lookup))
            as Arc<dyn SearchService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            search_service,
        })
    }
}
