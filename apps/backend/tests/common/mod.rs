//! Common test utilities and fixtures for integration tests.
//!
//! Every TestContext gets its own in-memory SQLite database with the
//! migrations applied, so tests run without any external services.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use chrono::NaiveDate;

use vocab_review_backend::config::Config;
use vocab_review_backend::db::Database;
use vocab_review_backend::{build_router, AppState};

/// Test context containing the database and the application router.
pub struct TestContext {
    pub db: Arc<Database>,
    pub state: AppState,
    app: Router,
}

impl TestContext {
    /// Create a new test context with default configuration.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a new test context with the given configuration.
    ///
    /// The database URL is always replaced with a private in-memory database.
    pub async fn with_config(config: Config) -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            ..config
        };
        let state = AppState::new(db, config);
        let app = build_router(state.clone());

        Self {
            db: state.db.clone(),
            state,
            app,
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Start an in-process test server.
    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to start test server")
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, name: Option<&str>) -> (i64, String) {
        let user = self
            .db
            .create_user(name)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Overwrite the scheduling fields of a word's memory state.
    pub async fn set_memory_state(
        &self,
        user_id: i64,
        word_id: i64,
        easiness_factor: f64,
        interval_days: i64,
        repetitions: i64,
        next_review_date: NaiveDate,
    ) {
        sqlx::query(
            r#"
            UPDATE memory_states
            SET easiness_factor = ?1, interval_days = ?2, repetitions = ?3, next_review_date = ?4
            WHERE user_id = ?5 AND word_id = ?6
            "#,
        )
        .bind(easiness_factor)
        .bind(interval_days)
        .bind(repetitions)
        .bind(next_review_date)
        .bind(user_id)
        .bind(word_id)
        .execute(self.db.pool())
        .await
        .expect("Failed to update memory state");
    }

    /// Authorization header for a user token.
    pub fn auth(token: &str) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .expect("token is a valid header value");
        (AUTHORIZATION, value)
    }
}
