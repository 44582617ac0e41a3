mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

use connectup::api::{create_router, AppState, RateLimiter};
use connectup::db::UserRepository;
use connectup::matching::MatchWriteMode;

use common::{call, signup, test_app, test_config, test_pool};

async fn make_match(app: &Router, a: (&str, &str), b: (&str, &str)) {
    let (status, _) = call(app, "POST", &format!("/api/v1/users/like/{}", b.1), Some(a.0), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(app, "POST", &format!("/api/v1/users/like/{}", a.1), Some(b.0), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMatch"], true);
}

#[tokio::test]
async fn health_reports_database() {
    let (app, _) = test_app().await;
    let (status, body) = call(&app, "GET", "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _) = test_app().await;
    let (status, body) = call(&app, "GET", "/api/v1/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("/api/v1/nowhere"));
}

#[tokio::test]
async fn signup_hides_credentials_and_rejects_duplicates() {
    let (app, _) = test_app().await;
    let (token, _) = signup(&app, "Alice").await;

    let (status, me) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.edu");
    assert!(me.get("passwordHash").is_none());
    assert!(me.get("passwordSalt").is_none());
    assert_eq!(me["likes"], json!([]));

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "name": "Alice Again",
            "email": "ALICE@example.edu",
            "password": "password123",
            "passwordConfirm": "password123",
            "branch": "CSE",
            "year": "2nd"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validates_input() {
    let (app, _) = test_app().await;
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/signup",
        None,
        Some(json!({
            "name": "Bob",
            "email": "bob@example.edu",
            "password": "password123",
            "passwordConfirm": "password124",
            "branch": "CSE",
            "year": "2nd"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_and_logout() {
    let (app, _) = test_app().await;
    signup(&app, "Alice").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@example.edu", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@example.edu", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = call(&app, "POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _) = test_app().await;

    let (status, _) = call(&app, "GET", "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/v1/users", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn like_flow_over_http() {
    let (app, _) = test_app().await;
    let (alice_token, alice_id) = signup(&app, "Alice").await;
    let (bob_token, bob_id) = signup(&app, "Bob").await;

    let (status, body) = call(&app, "POST", &format!("/api/v1/users/like/{}", bob_id), Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMatch"], false);
    assert_eq!(body["user"]["id"], bob_id.as_str());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, _) = call(&app, "POST", &format!("/api/v1/users/like/{}", bob_id), Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "POST", "/api/v1/users/like/missing", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "POST", &format!("/api/v1/users/like/{}", alice_id), Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMatch"], true);

    let (_, matches) = call(&app, "GET", "/api/v1/users/matches", Some(&alice_token), None).await;
    assert_eq!(matches[0]["id"], bob_id.as_str());

    let (status, body) = call(&app, "POST", &format!("/api/v1/users/dislike/{}", alice_id), Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn listing_skips_self_and_deactivated_users() {
    let (app, _) = test_app().await;
    let (alice_token, _) = signup(&app, "Alice").await;
    let (bob_token, bob_id) = signup(&app, "Bob").await;
    let (carol_token, _) = signup(&app, "Carol").await;

    let (_, users) = call(&app, "GET", "/api/v1/users", Some(&alice_token), None).await;
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", "/api/v1/users/me", Some(&carol_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, users) = call(&app, "GET", "/api/v1/users", Some(&alice_token), None).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], bob_id.as_str());

    // a deactivated account loses its session
    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&carol_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "PATCH",
        "/api/v1/users/me",
        Some(&bob_token),
        Some(json!({"bio": "Backend person", "year": "4th", "active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Backend person");
    assert_eq!(body["year"], "4th");
}

#[tokio::test]
async fn messaging_requires_a_match_and_marks_read() {
    let (app, _) = test_app().await;
    let (alice_token, alice_id) = signup(&app, "Alice").await;
    let (bob_token, bob_id) = signup(&app, "Bob").await;

    let send = |token: String, to: String, content: &'static str| {
        let app = app.clone();
        async move {
            call(
                &app,
                "POST",
                "/api/v1/messages",
                Some(&token),
                Some(json!({"receiverId": to, "content": content})),
            )
            .await
        }
    };

    let (status, _) = send(alice_token.clone(), bob_id.clone(), "hi").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    make_match(&app, (&alice_token, &alice_id), (&bob_token, &bob_id)).await;

    let (status, _) = send(alice_token.clone(), bob_id.clone(), "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, msg) = send(alice_token.clone(), bob_id.clone(), "hi bob").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(msg["senderName"], "Alice");
    assert_eq!(msg["read"], false);
    send(alice_token.clone(), bob_id.clone(), "are you there?").await;

    let (_, convos) = call(&app, "GET", "/api/v1/messages/conversations", Some(&bob_token), None).await;
    assert_eq!(convos[0]["unreadCount"], 2);
    assert_eq!(convos[0]["lastMessage"]["content"], "are you there?");

    let uri = format!("/api/v1/messages/conversation/{}", alice_id);
    let (status, messages) = call(&app, "GET", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hi bob");
    // payload shows the state before marking
    assert_eq!(messages[0]["read"], false);

    let (_, convos) = call(&app, "GET", "/api/v1/messages/conversations", Some(&bob_token), None).await;
    assert_eq!(convos[0]["unreadCount"], 0);
}

#[tokio::test]
async fn match_records_crud() {
    let (app, _) = test_app().await;
    let (alice_token, alice_id) = signup(&app, "Alice").await;
    let (bob_token, bob_id) = signup(&app, "Bob").await;
    let (carol_token, _) = signup(&app, "Carol").await;

    let (status, record) = call(&app, "POST", "/api/v1/matches", Some(&alice_token), Some(json!({"user2Id": bob_id}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "pending");
    assert_eq!(record["user1"]["id"], alice_id.as_str());
    assert_eq!(record["user1"]["name"], "Alice");
    assert_eq!(record["user2"]["name"], "Bob");
    assert!(record["user2"]["profilePhoto"].is_string());
    let id = record["id"].as_str().unwrap().to_string();

    // same pair in the other direction
    let (status, _) = call(&app, "POST", "/api/v1/matches", Some(&bob_token), Some(json!({"user2Id": alice_id}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/v1/matches/{}", id);
    let (status, _) = call(&app, "PATCH", &uri, Some(&carol_token), Some(json!({"status": "matched"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "PATCH", &uri, Some(&bob_token), Some(json!({"matchScore": 101}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, record) = call(
        &app,
        "PATCH",
        &uri,
        Some(&bob_token),
        Some(json!({"status": "matched", "matchScore": 87, "commonInterests": ["rust"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "matched");
    assert_eq!(record["matchScore"], 87);

    let (_, mine) = call(&app, "GET", "/api/v1/matches/my-matches", Some(&alice_token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = call(&app, "GET", "/api/v1/matches/my-matches", Some(&carol_token), None).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (status, _) = call(&app, "DELETE", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sessions_stop_resolving_once_the_account_is_inactive() {
    let (app, state) = test_app().await;
    let (token, user_id) = signup(&app, "Dana").await;

    // deactivated behind the API's back, session row still present
    UserRepository::deactivate(&state.db, &user_id).await.unwrap();

    let (status, _) = call(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_the_account_ends_its_sessions() {
    let (app, state) = test_app().await;
    let (token, user_id) = signup(&app, "Erin").await;

    let (status, _) = call(&app, "DELETE", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
        .bind(&user_id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn timestamps_are_epoch_milliseconds() {
    let (app, _) = test_app().await;
    let (alice_token, alice_id) = signup(&app, "Alice").await;
    let (bob_token, bob_id) = signup(&app, "Bob").await;
    make_match(&app, (&alice_token, &alice_id), (&bob_token, &bob_id)).await;

    let (_, me) = call(&app, "GET", "/api/v1/auth/me", Some(&alice_token), None).await;
    let (_, msg) = call(
        &app,
        "POST",
        "/api/v1/messages",
        Some(&alice_token),
        Some(json!({"receiverId": bob_id, "content": "hi"})),
    )
    .await;
    let (_, record) = call(&app, "POST", "/api/v1/matches", Some(&alice_token), Some(json!({"user2Id": bob_id}))).await;

    // anything after 2001 in milliseconds is above 1e12; seconds are not
    for ts in [&me["createdAt"], &me["lastActive"], &msg["createdAt"], &record["createdAt"], &record["updatedAt"]] {
        assert!(ts.as_i64().unwrap() > 1_000_000_000_000, "{} is not in milliseconds", ts);
    }
    assert!(msg["createdAt"].as_i64() >= me["createdAt"].as_i64());
}

#[tokio::test]
async fn rate_limited_clients_get_retry_after() {
    let state = AppState::new(test_pool().await, test_config(MatchWriteMode::Transactional));
    let app = create_router(state, Arc::new(RateLimiter::new(2, 60)));

    let health = || Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(health()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.clone().oneshot(health()).await.unwrap().status(), StatusCode::OK);

    let response = app.clone().oneshot(health()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
}
