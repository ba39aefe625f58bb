#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use foodlog::api::AppState;
use foodlog::clients::NutritionLookup;
use foodlog::config::Config;
use foodlog::db::Store;
use foodlog::entities::users;
use foodlog::state::SharedState;
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use tower::ServiceExt;

/// In-process stand-in for the nutrition API.
#[derive(Default)]
pub struct FakeNutrition {
    pub fail: bool,
    pub calls: AtomicUsize,
    /// When set, the named user is deleted while the lookup is in flight.
    pub delete_during_lookup: Option<String>,
    pub store: OnceLock<Store>,
}

impl FakeNutrition {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionLookup for FakeNutrition {
    async fn lookup(&self, food: &str) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            anyhow::bail!("Nutrition API error: 502 Bad Gateway");
        }

        if let (Some(username), Some(store)) = (&self.delete_during_lookup, self.store.get()) {
            users::Entity::delete_many()
                .filter(users::Column::Username.eq(username.as_str()))
                .exec(&store.conn)
                .await?;
        }

        Ok(json!({
            "items": [{ "name": food, "calories": 89.4, "serving_size_g": 100.0 }]
        }))
    }
}

/// Every test gets a private in-memory database; nothing is left on disk.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.security.token_secret = "test-token-secret".to_string();
    config.security.session_secret = "s".repeat(32);
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;
    config
}

pub async fn spawn_app_with(lookup: Arc<FakeNutrition>) -> (Arc<AppState>, Router) {
    let shared = SharedState::with_nutrition_lookup(test_config(), lookup.clone())
        .await
        .expect("failed to create shared state");
    let _ = lookup.store.set(shared.store.clone());

    let state = foodlog::api::create_app_state(Arc::new(shared), None);
    let router = foodlog::api::router(state.clone());
    (state, router)
}

pub async fn spawn_app() -> (Arc<AppState>, Router, Arc<FakeNutrition>) {
    let lookup = Arc::new(FakeNutrition::default());
    let (state, router) = spawn_app_with(lookup.clone()).await;
    (state, router, lookup)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Creates `username` with `password` and returns a bearer token for it.
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let credentials = json!({ "username": username, "password": password });

    let response = post_json(app, "/create-account", credentials.clone()).await;
    assert_eq!(response.status(), 201);

    let response = post_json(app, "/login", credentials).await;
    assert_eq!(response.status(), 200);

    body_json(response).await["token"]
        .as_str()
        .expect("login response has a token")
        .to_string()
}
