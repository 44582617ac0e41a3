#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;
use sqlx::{Pool, Sqlite};

use connectup::api::{create_router, AppState, RateLimiter};
use connectup::config::Config;
use connectup::crypto::{digest_password, PasswordDigest};
use connectup::db::{self, NewUser, User, UserRepository};
use connectup::matching::MatchWriteMode;
use connectup::MIGRATOR;

/// Fresh migrated in-memory database. One connection, never recycled, so
/// every query sees the same database.
pub async fn test_pool() -> Pool<Sqlite> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("sqlite options")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("connect sqlite");

    MIGRATOR.run(&pool).await.expect("migrate");
    pool
}

/// Migrated database in a temp file behind the production pool settings,
/// so several connections really run at once. Keep the directory alive for
/// as long as the pool.
pub async fn file_pool(max_connections: u32) -> (tempfile::TempDir, Pool<Sqlite>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("connectup.db").display()),
        db_max_connections: max_connections,
        db_min_connections: 1,
        ..Config::default()
    };

    let pool = db::connect(&config).await.expect("connect file db");
    MIGRATOR.run(&pool).await.expect("migrate");
    (dir, pool)
}

// hashing is slow in debug builds; every fixture user shares one digest
fn fixture_digest() -> &'static PasswordDigest {
    static DIGEST: OnceLock<PasswordDigest> = OnceLock::new();
    DIGEST.get_or_init(|| digest_password("password123").expect("digest"))
}

pub async fn create_user(pool: &Pool<Sqlite>, name: &str) -> User {
    let digest = fixture_digest();
    UserRepository::create(
        pool,
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.edu", name.to_lowercase()),
            branch: "CSE".to_string(),
            year: "3rd".to_string(),
            bio: String::new(),
            interests: vec!["rust".to_string()],
        },
        digest,
    )
    .await
    .expect("create user")
}

pub fn test_config(mode: MatchWriteMode) -> Arc<Config> {
    Arc::new(Config {
        match_write_mode: mode,
        rate_limit_max: 10_000,
        ..Config::default()
    })
}

pub async fn test_app() -> (axum::Router, AppState) {
    let pool = test_pool().await;
    let state = AppState::new(pool, test_config(MatchWriteMode::Transactional));
    let limiter = Arc::new(RateLimiter::new(10_000, 60));
    (create_router(state.clone(), limiter), state)
}

pub async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Signs up and returns (token, user id).
pub async fn signup(app: &Router, name: &str) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.edu", name.to_lowercase()),
            "password": "password123",
            "passwordConfirm": "password123",
            "branch": "CSE",
            "year": "2nd",
            "interests": ["rust", "ml"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}
