//! End-to-end tests for the HTTP surface, run against the in-memory store.

use std::sync::Arc;

use api_lib::adapters::{CloudinaryUrlBuilder, InMemorySessionStore, MemoryStore};
use api_lib::config::Config;
use api_lib::web::{self, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// -- Helpers ------------------------------------------------------------------

struct TestApp {
    router: Router,
    store: MemoryStore,
}

fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "memory://",
            "CLOUDINARY_CLOUD_NAME" => "demo",
            "SESSION_SECRET" => "test-session-secret",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

fn setup_app() -> TestApp {
    let config = Arc::new(test_config());
    let store = MemoryStore::new();
    let state = AppState::new(
        config.clone(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(CloudinaryUrlBuilder::new(&config.cloudinary)),
    );
    TestApp {
        router: web::router(Arc::new(state)),
        store,
    }
}

struct TestResponse {
    status: StatusCode,
    set_cookie: Option<String>,
    location: Option<String>,
    body: Value,
    text: String,
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(b) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(b.to_string())
        }
        None => Body::empty(),
    };

    let resp = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let header_str = |name: header::HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let set_cookie = header_str(header::SET_COOKIE);
    let location = header_str(header::LOCATION);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        set_cookie,
        location,
        body,
        text,
    }
}

fn record_body(id: i64) -> Value {
    json!({
        "id": id,
        "age": 18393,
        "gender": 2,
        "height": 168,
        "weight": 62.0,
        "ap_hi": 110,
        "ap_lo": 80,
        "cholesterol": 1,
        "gluc": 1,
        "smoke": 0,
        "alco": 0,
        "active": 1,
        "cardio": 0,
        "url": format!("https://cardio.example/u/{id}"),
        "qrcode_filename": format!("qr_{id}.png")
    })
}

async fn insert_record(app: &TestApp, body: Value) -> String {
    let resp = send(app, "POST", "/user", None, Some(body)).await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text);
    resp.body["user_id"].as_str().unwrap().to_string()
}

async fn register(app: &TestApp, username: &str, password: &str) -> String {
    let resp = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": username,
            "password": password,
            "first_name": "Test",
            "last_name": "User",
            "email": format!("{username}@example.org")
        })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text);
    resp.body["user_id"].as_str().unwrap().to_string()
}

/// Logs in and returns the `name=value` part of the session cookie.
async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let resp = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text);
    let set_cookie = resp.set_cookie.expect("login sets a session cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

// -- Root and edit pages ------------------------------------------------------

#[tokio::test]
async fn test_home_greeting() {
    let app = setup_app();
    let resp = send(&app, "GET", "/", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, "Welcome to the Cardio API!");
}

#[tokio::test]
async fn test_edit_redirects_to_edit_page() {
    let app = setup_app();
    let resp = send(&app, "GET", "/edit/12", None, None).await;
    assert!(resp.status.is_redirection());
    assert_eq!(resp.location.as_deref(), Some("/edit-page/12"));

    let resp = send(&app, "GET", "/edit-page/12", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, "Edit Page for User ID: 12");
}

#[tokio::test]
async fn test_health() {
    let app = setup_app();
    let resp = send(&app, "GET", "/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({ "status": "ok" }));
}

// -- Records ------------------------------------------------------------------

#[tokio::test]
async fn test_insert_then_fetch_returns_inserted_fields() {
    let app = setup_app();
    let object_id = insert_record(&app, record_body(1)).await;

    let resp = send(&app, "GET", "/userdata/1", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);

    let mut expected = record_body(1);
    expected["_id"] = json!(object_id);
    assert_eq!(resp.body, expected);
}

#[tokio::test]
async fn test_fetch_unknown_record_is_404() {
    let app = setup_app();
    let resp = send(&app, "GET", "/userdata/99", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], json!("User not found for ID 99"));
}

#[tokio::test]
async fn test_non_integer_path_is_400() {
    let app = setup_app();
    let resp = send(&app, "GET", "/userdata/abc", None, None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());
}

#[tokio::test]
async fn test_insert_missing_field_is_400() {
    let app = setup_app();
    let mut body = record_body(2);
    body.as_object_mut().unwrap().remove("cholesterol");

    let resp = send(&app, "POST", "/user", None, Some(body)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["error"],
        json!("Missing required field: cholesterol")
    );
    assert_eq!(app.store.record_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = setup_app();
    let req = Request::builder()
        .method("POST")
        .uri("/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_record_is_404_and_store_unchanged() {
    let app = setup_app();
    insert_record(&app, record_body(2)).await;

    let resp = send(
        &app,
        "PUT",
        "/user/1",
        None,
        Some(json!({ "height": 180, "weight": 75.5 })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.record_count(), 1);

    let resp = send(&app, "GET", "/userdata/2", None, None).await;
    assert_eq!(resp.body["height"], json!(168));
}

#[tokio::test]
async fn test_update_missing_record_is_404_before_body_checks() {
    let app = setup_app();

    let resp = send(
        &app,
        "PUT",
        "/user/99",
        None,
        Some(json!({ "height": "tall", "weight": 75.5 })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], json!("User not found for ID 99"));

    let resp = send(&app, "PUT", "/user/99", None, Some(json!({}))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_merges_height_and_weight() {
    let app = setup_app();
    insert_record(&app, record_body(1)).await;

    let resp = send(
        &app,
        "PUT",
        "/user/1",
        None,
        Some(json!({ "height": 180, "weight": 75.5 })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], json!("User 1 updated successfully"));

    let resp = send(&app, "GET", "/userdata/1", None, None).await;
    assert_eq!(resp.body["height"], json!(180));
    assert_eq!(resp.body["weight"], json!(75.5));
    assert_eq!(resp.body["ap_hi"], json!(110));
}

#[tokio::test]
async fn test_update_accepts_nested_envelope() {
    let app = setup_app();
    insert_record(&app, record_body(5)).await;

    let resp = send(
        &app,
        "PUT",
        "/user/5",
        None,
        Some(json!({ "sessionsByUser": { "5": { "height": "172", "weight": "70.25" } } })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = send(&app, "GET", "/userdata/5", None, None).await;
    assert_eq!(resp.body["height"], json!(172));
    assert_eq!(resp.body["weight"], json!(70.25));
}

#[tokio::test]
async fn test_update_non_numeric_height_is_400() {
    let app = setup_app();
    insert_record(&app, record_body(1)).await;

    let resp = send(
        &app,
        "PUT",
        "/user/1",
        None,
        Some(json!({ "height": "tall", "weight": 75.5 })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["error"],
        json!("Invalid format: height must be an integer")
    );

    let resp = send(&app, "GET", "/userdata/1", None, None).await;
    assert_eq!(resp.body["height"], json!(168));
}

// -- Images -------------------------------------------------------------------

#[tokio::test]
async fn test_image_url_for_record_with_path() {
    let app = setup_app();
    let mut body = record_body(3);
    body["path"] = json!("cardio/patient_3.png");
    insert_record(&app, body).await;

    let resp = send(&app, "GET", "/image/3", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body["image_url"],
        json!("https://res.cloudinary.com/demo/image/upload/v1/cardio/patient_3.png")
    );
}

#[tokio::test]
async fn test_image_for_record_without_path_is_404() {
    let app = setup_app();
    insert_record(&app, record_body(4)).await;

    let resp = send(&app, "GET", "/image/4", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], json!("Image not found for ID 4"));

    let resp = send(&app, "GET", "/image/404", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// -- Auth ---------------------------------------------------------------------

#[tokio::test]
async fn test_register_then_login() {
    let app = setup_app();
    let user_id = register(&app, "ada", "analytical").await;

    let resp = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "ada", "password": "analytical" })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user_id"], json!(user_id));
    let cookie = resp.set_cookie.unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let app = setup_app();
    register(&app, "ada", "analytical").await;

    let resp = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "ada", "password": "difference" })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.set_cookie.is_none());

    let resp = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "nobody", "password": "analytical" })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_missing_field_is_400() {
    let app = setup_app();
    let resp = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "ada", "password": "pw", "first_name": "Ada" })),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], json!("Missing required field: last_name"));
}

#[tokio::test]
async fn test_logout_without_session_is_401() {
    let app = setup_app();
    let resp = send(&app, "GET", "/logout", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = setup_app();
    let user_id = register(&app, "ada", "analytical").await;
    let cookie = login(&app, "ada", "analytical").await;

    let resp = send(&app, "GET", "/me", Some(&cookie), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user_id"], json!(user_id));

    let resp = send(&app, "GET", "/logout", Some(&cookie), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.set_cookie.unwrap().contains("Max-Age=0"));

    let resp = send(&app, "GET", "/me", Some(&cookie), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    let resp = send(&app, "GET", "/logout", Some(&cookie), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_session_cookie_is_rejected() {
    let app = setup_app();
    register(&app, "ada", "analytical").await;
    let cookie = login(&app, "ada", "analytical").await;

    // Keep the token but drop the signature.
    let (token, _signature) = cookie.rsplit_once('.').unwrap();
    let resp = send(&app, "GET", "/me", Some(token), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = send(&app, "GET", "/me", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.body["error"].is_string());
}
