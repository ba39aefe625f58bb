mod common;

use std::sync::Arc;

use axum::http::{StatusCode, header::SET_COOKIE};
use chrono::{Duration, Utc};
use common::{
    FakeNutrition, body_json, body_text, get, post_json, register_and_login, spawn_app,
    spawn_app_with,
};
use foodlog::api::auth::GateOutcome;
use foodlog::entities::search_history;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

#[tokio::test]
async fn test_connection_endpoint() {
    let (_, app, _) = spawn_app().await;

    let response = get(&app, "/test", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Server is working!");
}

#[tokio::test]
async fn test_create_account_succeeds_exactly_once() {
    let (_, app, _) = spawn_app().await;
    let credentials = json!({ "username": "alice", "password": "secret" });

    let response = post_json(&app, "/create-account", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "Account created successfully" })
    );

    let response = post_json(&app, "/create-account", credentials).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "exists": true, "message": "Username already taken" })
    );
}

#[tokio::test]
async fn test_create_account_rejects_bad_bodies() {
    let (_, app, _) = spawn_app().await;

    let response = post_json(&app, "/create-account", json!({ "username": "alice" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = post_json(
        &app,
        "/create-account",
        json!({ "username": "", "password": "secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Username is required" })
    );
}

#[tokio::test]
async fn test_login_issues_token() {
    let (state, app, _) = spawn_app().await;
    let credentials = json!({ "username": "alice", "password": "secret" });
    post_json(&app, "/create-account", credentials.clone()).await;

    let response = post_json(&app, "/login", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    let token = body["token"].as_str().unwrap();
    assert_eq!(state.tokens().verify(token).unwrap(), "alice");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (_, app, _) = spawn_app().await;
    post_json(
        &app,
        "/create-account",
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;

    let response = post_json(
        &app,
        "/login",
        json!({ "username": "alice", "password": "not-the-secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "error": "Invalid credentials" }));
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_login_with_unknown_user() {
    let (_, app, _) = spawn_app().await;

    let response = post_json(
        &app,
        "/login",
        json!({ "username": "nobody", "password": "secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid credentials" })
    );
}

#[tokio::test]
async fn test_session_gate_statuses() {
    let (state, app, lookup) = spawn_app().await;
    post_json(
        &app,
        "/create-account",
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;

    let response = get(&app, "/api/banana", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!("You are not authenticated"));

    let response = get(&app, "/api/banana", Some("not.a.token")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!("Token is invalid"));

    let expired = state
        .tokens()
        .issue_at("alice", Utc::now() - Duration::hours(2))
        .unwrap();
    let response = get(&app, "/api/banana", Some(&expired)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let ghost = state.tokens().issue("ghost").unwrap();
    let response = get(&app, "/api/banana", Some(&ghost)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!("User not found"));

    // Rejected requests never reach the nutrition API.
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_history_route_is_gated() {
    let (_, app, _) = spawn_app().await;

    let response = get(&app, "/api/search-history", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_then_history() {
    let (_, app, lookup) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    let response = get(&app, "/api/banana", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["items"][0]["name"], "banana");
    assert_eq!(lookup.calls(), 1);

    let response = get(&app, "/api/search-history", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["food"], "banana");
    assert_eq!(history[0]["response"], json!({ "items": payload["items"] }));
}

#[tokio::test]
async fn test_history_preserves_order() {
    let (_, app, _) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    for food in ["apple", "banana", "cherry", "banana"] {
        let response = get(&app, &format!("/api/{food}"), Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = body_json(get(&app, "/api/search-history", Some(&token)).await).await;
    let foods: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["food"].as_str().unwrap())
        .collect();

    assert_eq!(foods, vec!["apple", "banana", "cherry", "banana"]);
}

#[tokio::test]
async fn test_history_is_per_user() {
    let (_, app, _) = spawn_app().await;
    let alice = register_and_login(&app, "alice", "secret").await;
    let bob = register_and_login(&app, "bob", "hunter2").await;

    get(&app, "/api/apple", Some(&alice)).await;
    get(&app, "/api/bread", Some(&bob)).await;

    let body = body_json(get(&app, "/api/search-history", Some(&bob)).await).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["food"], "bread");
}

#[tokio::test]
async fn test_upstream_failure_does_not_record() {
    let lookup = Arc::new(FakeNutrition::failing());
    let (_, app) = spawn_app_with(lookup.clone()).await;
    let token = register_and_login(&app, "alice", "secret").await;

    let response = get(&app, "/api/banana", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_text(response).await,
        "An error occurred while fetching data"
    );
    assert_eq!(lookup.calls(), 1);

    let body = body_json(get(&app, "/api/search-history", Some(&token)).await).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_payload_returned_when_recording_fails() {
    let lookup = Arc::new(FakeNutrition {
        delete_during_lookup: Some("alice".to_string()),
        ..FakeNutrition::default()
    });
    let (_, app) = spawn_app_with(lookup.clone()).await;
    let token = register_and_login(&app, "alice", "secret").await;

    // The user row disappears mid-request, so the history insert fails.
    let response = get(&app, "/api/banana", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"][0]["name"], "banana");

    let response = get(&app, "/api/search-history", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_searches_both_recorded() {
    let (_, app, _) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    let (first, second) = tokio::join!(
        get(&app, "/api/apple", Some(&token)),
        get(&app, "/api/pear", Some(&token)),
    );
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let body = body_json(get(&app, "/api/search-history", Some(&token)).await).await;
    let mut foods: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["food"].as_str().unwrap())
        .collect();
    foods.sort_unstable();

    assert_eq!(foods, vec!["apple", "pear"]);
}

#[tokio::test]
async fn test_google_login_echoes_token_and_sets_session() {
    let (_, app, _) = spawn_app().await;

    let response = post_json(&app, "/google-login", json!({ "token": "google-abc" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(SET_COOKIE));
    assert_eq!(body_json(response).await, json!({ "token": "google-abc" }));

    let response = post_json(&app, "/google-login", json!({ "token": "google-abc" })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_google_account_details_stay_private() {
    let (state, app, _) = spawn_app().await;
    post_json(&app, "/google-login", json!({ "token": "google-abc" })).await;

    let user = state.store().find_or_create_google_user("google-abc").await.unwrap();
    let token = state.tokens().issue(&user.username).unwrap();

    let body = body_json(get(&app, "/api/search-history", Some(&token)).await).await;
    assert_eq!(body, json!({ "success": true, "data": [] }));
    assert!(!body.to_string().contains(&user.username));
}

#[tokio::test]
async fn test_google_login_requires_token() {
    let (_, app, _) = spawn_app().await;

    let response = post_json(&app, "/google-login", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_records_food_as_received() {
    let (_, app, _) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    let response = get(&app, "/api/%20banana%20", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"][0]["name"], " banana ");

    let body = body_json(get(&app, "/api/search-history", Some(&token)).await).await;
    assert_eq!(body["data"][0]["food"], " banana ");
}

#[tokio::test]
async fn test_blank_food_is_rejected_without_lookup() {
    let (_, app, lookup) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    let response = get(&app, "/api/%20%20", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn test_login_survives_corrupt_history() {
    let (state, app, _) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;
    let alice = state.store().find_user_by_username("alice").await.unwrap().unwrap();

    search_history::ActiveModel {
        user_id: Set(alice.id),
        food: Set("banana".to_string()),
        response_json: Set("{not json".to_string()),
        created_at: Set("2026-01-01T00:00:00Z".to_string()),
        ..Default::default()
    }
    .insert(&state.store().conn)
    .await
    .unwrap();

    let response = post_json(
        &app,
        "/login",
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "alice");

    // The gate still needs the full record.
    let response = get(&app, "/api/search-history", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_gate_outcome_is_reported() {
    let (state, app, _) = spawn_app().await;
    let token = register_and_login(&app, "alice", "secret").await;

    let response = get(&app, "/api/banana", None).await;
    assert_eq!(
        response.extensions().get::<GateOutcome>(),
        Some(&GateOutcome::Rejected("missing_token"))
    );

    let response = get(&app, "/api/banana", Some("garbage")).await;
    assert_eq!(
        response.extensions().get::<GateOutcome>(),
        Some(&GateOutcome::Rejected("invalid_token"))
    );

    let ghost = state.tokens().issue("ghost").unwrap();
    let response = get(&app, "/api/banana", Some(&ghost)).await;
    assert_eq!(
        response.extensions().get::<GateOutcome>(),
        Some(&GateOutcome::Rejected("unknown_user"))
    );

    let response = get(&app, "/api/banana", Some(&token)).await;
    assert_eq!(
        response.extensions().get::<GateOutcome>(),
        Some(&GateOutcome::Admitted {
            username: "alice".to_string()
        })
    );

    let response = get(&app, "/test", None).await;
    assert!(response.extensions().get::<GateOutcome>().is_none());
}
