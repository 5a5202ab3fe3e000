//! Shared helpers for integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use snippy::{
    access::OperatorSecret,
    db::DbPool,
    notify::MemoryNotifier,
    server::{
        http::{AppState, router},
        setup_database,
    },
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Operator secret configured by [`TestApp`].
pub const SECRET: &str = "test-operator-secret";

/// A migrated `SQLite` database in a temporary directory.
pub struct TestDb {
    _dir: TempDir,
    /// Path of the database file.
    pub path: String,
    /// Pool over the database.
    pub pool: DbPool,
}

/// Create a fresh database with every migration applied.
///
/// # Panics
///
/// Panics if the temporary directory or the database cannot be prepared.
pub async fn migrated_db() -> TestDb {
    let dir = TempDir::new().expect("failed to create tempdir");
    let path = dir
        .path()
        .join("snippy-test.db")
        .to_string_lossy()
        .into_owned();
    let pool = setup_database(&path)
        .await
        .expect("failed to prepare database");
    TestDb {
        _dir: dir,
        path,
        pool,
    }
}

/// Router plus the handles a test needs to inspect.
pub struct TestApp {
    /// Keeps the database alive.
    pub db: TestDb,
    /// Router under test.
    pub router: Router,
    /// Captures every code notification.
    pub notifier: Arc<MemoryNotifier>,
    /// State shared with the router.
    pub state: AppState,
}

/// Build the application over a fresh database with [`SECRET`] configured.
pub async fn test_app() -> TestApp {
    test_app_with_secret(Some(SECRET)).await
}

/// Build the application with the given operator secret.
pub async fn test_app_with_secret(secret: Option<&str>) -> TestApp {
    let db = migrated_db().await;
    let notifier = Arc::new(MemoryNotifier::new());
    let state = AppState::new(
        db.pool.clone(),
        OperatorSecret::new(secret.map(str::to_owned)),
        notifier.clone(),
    );
    TestApp {
        router: router(state.clone()),
        db,
        notifier,
        state,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response body.
    ///
    /// Non-JSON bodies come back as a JSON string.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// `GET` a path.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    /// Send a JSON body with the given method.
    pub async fn json(&self, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }

    /// `POST` a JSON body.
    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.json("POST", uri, body).await
    }
}
