//! Common test utilities and fixtures for integration tests.
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).
//! Quiz sets are cached in memory, so no S3 bucket is needed.

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;

use vocab_quiz_backend::config::Config;
use vocab_quiz_backend::db::Database;
use vocab_quiz_backend::models::{DbItem, ItemRequest, UserRegisterRequest};
use vocab_quiz_backend::services::cache::{MemoryQuizCache, QuizCache};
use vocab_quiz_backend::services::password::{generate_token, hash_password, hash_token};
use vocab_quiz_backend::{build_router, AppState};

pub const TEST_PASSWORD: &str = "test-password-123";

/// Test context containing database connection and router.
pub struct TestContext {
    pub db: Arc<Database>,
    pub cache: Arc<QuizCache>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let config = Config::from_lookup(|key| match key {
            "QUIZ_CACHE" => Some("memory".to_string()),
            _ => std::env::var(key).ok(),
        })
        .expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let cache = Arc::new(QuizCache::Memory(MemoryQuizCache::new(
            Duration::from_secs(600),
        )));

        let state = AppState {
            db: db.clone(),
            cache: cache.clone(),
            config: Arc::new(config),
        };

        Self {
            db,
            cache,
            app: build_router(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a user directly in the database and return its ID, name and a
    /// valid bearer token.
    pub async fn create_test_user(&self, is_superuser: bool) -> (i64, String, String) {
        let user_name = fixtures::unique_name("user");
        let request = UserRegisterRequest {
            email: format!("{}@example.com", user_name),
            user_name: user_name.clone(),
            password: TEST_PASSWORD.to_string(),
            full_name: None,
        };
        let password_hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
        let user = self
            .db
            .create_user(&request, &password_hash, is_superuser)
            .await
            .expect("Failed to create test user");

        let token = generate_token();
        self.db
            .create_access_token(
                user.id,
                &hash_token(&token),
                Utc::now() + chrono::Duration::minutes(15),
            )
            .await
            .expect("Failed to create access token");

        (user.id, user_name, token)
    }

    /// Insert `count` items owned by `user_id` with the given grade.
    pub async fn create_test_items(&self, user_id: i64, count: usize, grade: i32) -> Vec<DbItem> {
        let requests: Vec<ItemRequest> = (1..=count)
            .map(|i| fixtures::item_request(&format!("word{}", i), &format!("単語{}", i), grade))
            .collect();
        self.db
            .create_items(user_id, &requests)
            .await
            .expect("Failed to create test items")
    }

    /// Create a deck for `user_id` holding `count` fresh items.
    pub async fn create_test_deck(&self, user_id: i64, count: usize) -> (i64, Vec<DbItem>) {
        let deck = self
            .db
            .create_deck(user_id, &fixtures::unique_name("deck"))
            .await
            .expect("Failed to create test deck");
        let items = self
            .create_test_items(user_id, count, fixtures::unique_grade())
            .await;
        for item in &items {
            self.db
                .add_deck_item(deck.id, item.id)
                .await
                .expect("Failed to attach item");
        }
        (deck.id, items)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a user.
    pub async fn cleanup_user(&self, user_id: i64) {
        // Items only lose their owner on user delete, so remove them first
        let _ = sqlx::query("DELETE FROM items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}
