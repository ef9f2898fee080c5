use std::time::Duration;

use axum::{body::Body, http::Request, http::StatusCode};
use guildgate_core::UserId;
use guildgate_server::{build_router_with_services, AccessTokenKey, AppConfig, SeedDocument};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
const GUILD_ID: &str = "80351110224678912";

async fn test_app() -> axum::Router {
    let seed = json!({
        "guilds": [{
            "guild_id": GUILD_ID,
            "name": "Tavern",
            "owner_id": "owner_1",
            "settings": {"prefix": "!", "welcome_channel": "general"},
            "roles": [
                {"role_id": "admins", "permissions": ["administrator"]},
                {"role_id": "stewards", "permissions": ["manage_guild"]},
                {"role_id": "mods", "permissions": ["kick_members", "ban_members"]}
            ],
            "members": [
                {"user_id": "admin_1", "role_ids": ["admins"]},
                {"user_id": "steward_1", "role_ids": ["stewards", "mods"]},
                {"user_id": "mod_1", "role_ids": ["mods"]}
            ]
        }]
    })
    .to_string();
    let services = SeedDocument::from_json(&seed)
        .expect("seed should parse")
        .into_services()
        .await
        .expect("seed should load");
    build_router_with_services(
        &AppConfig {
            max_body_bytes: 1024 * 64,
            request_timeout: Duration::from_secs(2),
            rate_limit_requests_per_minute: 200,
            access_token_key: Some(String::from(TOKEN_KEY)),
        },
        services,
    )
    .expect("router should build")
}

fn token_for(user_id: &str) -> String {
    AccessTokenKey::from_base64(TOKEN_KEY)
        .expect("key should decode")
        .issue(
            &UserId::try_from(user_id.to_owned()).expect("user id should be valid"),
            Duration::from_secs(60),
        )
        .expect("token should mint")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request should build")
}

async fn parse_json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    serde_json::from_slice(&body).expect("response body should be valid json")
}

#[tokio::test]
async fn owner_and_role_managers_can_read_guild_and_data() {
    let app = test_app().await;

    for user_id in ["owner_1", "admin_1", "steward_1"] {
        let token = token_for(user_id);
        let guild_response = app
            .clone()
            .oneshot(get(&format!("/guilds/{GUILD_ID}"), Some(&token)))
            .await
            .expect("guild request should execute");
        assert_eq!(guild_response.status(), StatusCode::OK, "user {user_id}");
        let guild: Value = parse_json_body(guild_response).await;
        assert_eq!(guild["guild_id"], GUILD_ID);
        assert_eq!(guild["name"], "Tavern");
        assert_eq!(guild["owner_id"], "owner_1");

        let data_response = app
            .clone()
            .oneshot(get(&format!("/guilds/{GUILD_ID}/data"), Some(&token)))
            .await
            .expect("data request should execute");
        assert_eq!(data_response.status(), StatusCode::OK);
        let data: Value = parse_json_body(data_response).await;
        assert_eq!(data["settings"]["prefix"], "!");
        assert_eq!(data["settings"]["welcome_channel"], "general");
    }
}

#[tokio::test]
async fn members_without_management_roles_are_forbidden() {
    let app = test_app().await;

    for user_id in ["mod_1", "stranger"] {
        let response = app
            .clone()
            .oneshot(get(
                &format!("/guilds/{GUILD_ID}"),
                Some(&token_for(user_id)),
            ))
            .await
            .expect("request should execute");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = parse_json_body(response).await;
        assert_eq!(body["error"], "not_a_manager");
    }
}

#[tokio::test]
async fn unknown_guild_returns_not_found() {
    let app = test_app().await;
    let response = app
        .oneshot(get("/guilds/1243qr5", Some(&token_for("owner_1"))))
        .await
        .expect("request should execute");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = parse_json_body(response).await;
    assert_eq!(body["error"], "guild_not_found");
}

#[tokio::test]
async fn guild_routes_require_a_valid_bearer_token() {
    let app = test_app().await;

    let missing = app
        .clone()
        .oneshot(get(&format!("/guilds/{GUILD_ID}"), None))
        .await
        .expect("request should execute");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body: Value = parse_json_body(missing).await;
    assert_eq!(body["error"], "unauthorized");

    let foreign_token = AccessTokenKey::generate()
        .expect("key should generate")
        .issue(
            &UserId::try_from(String::from("owner_1")).expect("user id should be valid"),
            Duration::from_secs(60),
        )
        .expect("token should mint");
    let forged = app
        .clone()
        .oneshot(get(&format!("/guilds/{GUILD_ID}"), Some(&foreign_token)))
        .await
        .expect("request should execute");
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let metrics = app
        .oneshot(get("/metrics", None))
        .await
        .expect("metrics should execute");
    let text = axum::body::to_bytes(metrics.into_body(), usize::MAX)
        .await
        .expect("metrics body should be readable");
    let text = String::from_utf8(text.to_vec()).expect("metrics should be utf-8");
    assert!(text.contains("guildgate_auth_failures_total{reason=\"missing_token\"}"));
    assert!(text.contains("guildgate_auth_failures_total{reason=\"invalid_token\"}"));
    assert!(!text.contains("guildgate_guard_outcomes_total{outcome=\"unauthorized\"}"));
}

#[tokio::test]
async fn references_no_guild_could_carry_are_not_found() {
    let app = test_app().await;
    let long_reference = format!("/guilds/{}", "9".repeat(65));
    for uri in ["/guilds/bad.id", "/guilds/not%20valid", long_reference.as_str()] {
        let response = app
            .clone()
            .oneshot(get(uri, Some(&token_for("owner_1"))))
            .await
            .expect("request should execute");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");
        let body: Value = parse_json_body(response).await;
        assert_eq!(body["error"], "guild_not_found");
        assert_eq!(body["message"], "Guild not found");
    }
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = test_app().await;

    let health = app
        .clone()
        .oneshot(get("/health", None))
        .await
        .expect("health should execute");
    assert_eq!(health.status(), StatusCode::OK);
    let health_body: Value = parse_json_body(health).await;
    assert_eq!(health_body, json!({"status": "ok"}));

    let _ = app
        .clone()
        .oneshot(get(&format!("/guilds/{GUILD_ID}"), Some(&token_for("owner_1"))))
        .await
        .expect("guild request should execute");
    let metrics = app
        .oneshot(get("/metrics", None))
        .await
        .expect("metrics should execute");
    assert_eq!(metrics.status(), StatusCode::OK);
    let text = axum::body::to_bytes(metrics.into_body(), usize::MAX)
        .await
        .expect("metrics body should be readable");
    let text = String::from_utf8(text.to_vec()).expect("metrics should be utf-8");
    assert!(text.contains("guildgate_guard_outcomes_total{outcome=\"authorized\"}"));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = test_app().await;
    let response = app
        .oneshot(get("/health", None))
        .await
        .expect("health should execute");
    assert!(response.headers().contains_key("x-request-id"));
}
