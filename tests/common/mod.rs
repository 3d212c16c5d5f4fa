//! Common test utilities

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use spendlog::api::AppState;
use spendlog::notify::Notifier;

/// Connect to the test database. Tests isolate themselves with unique
/// emails instead of truncating, so they can run in parallel.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB")
}

/// The full application stack, middleware included.
pub fn test_app(pool: PgPool) -> Router {
    spendlog::build_router(AppState {
        pool: pool.clone(),
        notifier: Notifier::spawn(pool),
    })
}

/// Send one request and return (status, parsed JSON body).
/// Non-JSON or empty bodies come back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
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
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

/// A unique email per call so parallel tests never collide.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// Register a user and log them in; returns (user_id, email, token).
pub async fn register_and_login(app: &Router, name: &str) -> (Uuid, String, String) {
    let email = unique_email(name);

    let (status, user) = send(
        app,
        "POST",
        "/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "secret-password",
            "password_confirmation": "secret-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", user);

    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();

    let token = login(app, &email, "secret-password").await;

    (user_id, email, token)
}

/// Log in and return the issued token.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    body["token"].as_str().unwrap().to_string()
}

/// Create an expense for the token holder and return its wire shape.
pub async fn create_expense(
    app: &Router,
    token: &str,
    description: &str,
    date: &str,
    value: i64,
) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/expenses",
        Some(token),
        Some(serde_json::json!({
            "description": description,
            "date": date,
            "value": value,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "expense creation failed: {}", body);

    body
}
