use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use builderboard::config::Config;
use builderboard::db;
use builderboard::routes::build_router;
use builderboard::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn create_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let app = build_router(AppState::new(pool, Config::default()));
    (app, temp_dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_profile(app: &Router, user_id: &str, username: &str) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/profiles",
        Some(user_id),
        Some(json!({
            "username": username,
            "display_name": username.to_uppercase(),
            "email": format!("{}@gmail.com", username),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_leaderboard() {
    let (app, _temp) = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/leaderboard", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_mutations_require_identity() {
    let (app, _temp) = create_test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/profiles",
        None,
        Some(json!({"username": "ada", "display_name": "Ada", "email": "a@b.c"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/profiles/bob/upvote", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_profile_is_conflict() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "user-1", "ada").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/profiles",
        Some("user-2"),
        Some(json!({"username": "ada", "display_name": "Ada", "email": "x@y.z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upvote_flow_updates_leaderboard() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "alice", "alice").await;
    create_profile(&app, "bob", "bob").await;

    let (_, body) = send(&app, Method::GET, "/api/profiles/bob/upvote", Some("alice"), None).await;
    assert_eq!(body["can_upvote"], true);

    let (status, body) = send(&app, Method::POST, "/api/profiles/bob/upvote", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, Method::POST, "/api/profiles/bob/upvote", Some("alice"), None).await;
    assert_eq!(body["success"], false);

    let (_, board) = send(&app, Method::GET, "/api/leaderboard?sort_by=all-time", None, None).await;
    assert_eq!(board[0]["user_id"], "bob");
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[0]["upvotes"], 1);
    assert_eq!(board[0]["score"], 40);
    assert_eq!(board[1]["user_id"], "alice");
    assert_eq!(board[1]["rank"], 2);

    let (_, body) = send(&app, Method::DELETE, "/api/profiles/bob/upvote", Some("alice"), None).await;
    assert_eq!(body["success"], true);
    let (_, detail) = send(&app, Method::GET, "/api/profiles/bob", None, None).await;
    assert_eq!(detail["upvotes"], 0);
}

#[tokio::test]
async fn test_invalid_sort_by_is_rejected() {
    let (app, _temp) = create_test_app();
    let (status, _) = send(&app, Method::GET, "/api/leaderboard?sort_by=weekly", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_newcomers_leaderboard_lists_new_profiles() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "u1", "fresh").await;

    let (status, board) = send(&app, Method::GET, "/api/leaderboard?sort_by=newcomers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_lifecycle() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;
    create_profile(&app, "eve", "eve").await;

    let (status, project) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some("bob"),
        Some(json!({"title": "Rocket", "description": "Goes up"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = project["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/projects/{}", id),
        Some("eve"),
        Some(json!({"title": "Mine now"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, Method::POST, &format!("/api/projects/{}/upvote", id), Some("eve"), None).await;
    assert_eq!(body["success"], true);
    let (status, _) = send(&app, Method::POST, &format!("/api/projects/{}/views", id), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, trending) = send(&app, Method::GET, "/api/projects/trending?limit=5", None, None).await;
    assert_eq!(trending[0]["id"], id.as_str());
    assert_eq!(trending[0]["upvotes"], 1);
    assert_eq!(trending[0]["views"], 1);
    assert_eq!(trending[0]["owner_username"], "bob");

    let (_, detail) = send(&app, Method::GET, "/api/profiles/by-username/bob", None, None).await;
    assert_eq!(detail["projects"][0]["title"], "Rocket");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/projects/{}", id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, projects) = send(&app, Method::GET, "/api/profiles/bob/projects", None, None).await;
    assert_eq!(projects, json!([]));
}

#[tokio::test]
async fn test_analytics_endpoints() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;

    let (status, _) = send(&app, Method::POST, "/api/profiles/bob/views", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, "/api/profiles/ghost/views", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, analytics) = send(&app, Method::GET, "/api/analytics/users/bob", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["profile"]["views"], 1);
    assert_eq!(analytics["dailyStats"][0]["views"], 1);

    let (status, _) = send(&app, Method::GET, "/api/analytics/users/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, growth) = send(&app, Method::GET, "/api/analytics/users/bob/growth", None, None).await;
    assert_eq!(growth, json!({"views_growth": 0, "upvotes_growth": 0}));

    let (_, daily) = send(&app, Method::GET, "/api/analytics/users/bob/daily?days=3", None, None).await;
    assert_eq!(daily.as_array().unwrap().len(), 1);

    let (_, timeline) = send(&app, Method::GET, "/api/analytics/users/bob/timeline?days=7&limit=5", None, None).await;
    assert_eq!(timeline, json!([]));

    let (_, global) = send(&app, Method::GET, "/api/analytics/global", None, None).await;
    assert_eq!(global["users"]["total"], 1);
    assert_eq!(global["users"]["newThisWeek"], 1);
    assert_eq!(global["engagement"]["totalViews"], 1);
}

#[tokio::test]
async fn test_analytics_lookback_is_capped() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;

    let (status, timeline) = send(
        &app,
        Method::GET,
        "/api/analytics/users/bob/timeline?days=9223372036854775807",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timeline, json!([]));

    let (status, daily) = send(
        &app,
        Method::GET,
        "/api/analytics/users/bob/daily?days=100000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(daily.is_array());
}

#[tokio::test]
async fn test_profile_update_and_activity() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/profiles/me",
        Some("bob"),
        Some(json!({"goal": {"title": "Launch", "progress_percent": 150}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for progress in [300, -5] {
        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/profiles/me",
            Some("bob"),
            Some(json!({"goal": {"title": "Launch", "progress_percent": progress}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, profile) = send(
        &app,
        Method::PATCH,
        "/api/profiles/me",
        Some("bob"),
        Some(json!({"bio": "Builder", "goal": {"title": "Launch", "progress_percent": 20}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bio"], "Builder");
    assert_eq!(profile["goal"]["progress_percent"], 20);

    let (_, streak) = send(&app, Method::POST, "/api/profiles/me/activity", Some("bob"), None).await;
    assert_eq!(streak["streak"], 1);

    let (_, me) = send(&app, Method::GET, "/api/profiles/me", Some("bob"), None).await;
    assert_eq!(me["streak"], 1);
}

#[tokio::test]
async fn test_location_and_map() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/profiles/me/location",
        Some("bob"),
        Some(json!({"lat": 200.0, "lng": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/profiles/me/location",
        Some("bob"),
        Some(json!({"lat": 35.68, "lng": 139.69, "city": "Tokyo", "country": "Japan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, pins) = send(&app, Method::GET, "/api/map", None, None).await;
    assert_eq!(pins[0]["location"]["city"], "Tokyo");

    let (_, _) = send(
        &app,
        Method::PUT,
        "/api/profiles/me/location/visibility",
        Some("bob"),
        Some(json!({"hidden": true})),
    )
    .await;
    let (_, pins) = send(&app, Method::GET, "/api/map", None, None).await;
    assert_eq!(pins, json!([]));
}

#[tokio::test]
async fn test_badges_and_refresh() {
    let (app, _temp) = create_test_app();
    create_profile(&app, "bob", "bob").await;
    for i in 0..10 {
        let fan = format!("fan-{}", i);
        send(&app, Method::POST, "/api/profiles/bob/upvote", Some(&fan), None).await;
    }

    let (_, body) = send(&app, Method::GET, "/api/profiles/bob/badges", None, None).await;
    assert_eq!(body["badges"], json!(["Bronze"]));

    let (_, body) = send(&app, Method::POST, "/api/leaderboard/refresh", None, None).await;
    assert_eq!(body["updated"], 1);

    let (_, detail) = send(&app, Method::GET, "/api/profiles/bob", None, None).await;
    assert_eq!(detail["rank"], 1);
    assert_eq!(detail["badges"], json!(["Bronze"]));

    let (_, featured) = send(&app, Method::GET, "/api/featured", None, None).await;
    assert_eq!(featured[0]["user_id"], "bob");
    assert_eq!(featured[0]["project_count"], 0);

    let (status, _) = send(&app, Method::GET, "/api/profiles/ghost/badges", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
