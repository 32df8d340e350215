pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CacheBackend, Config};
use crate::db::Database;
use crate::models::UserRegisterRequest;
use crate::services::cache::{MemoryQuizCache, QuizCache, S3QuizCache};
use crate::services::password::hash_password;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: Arc<QuizCache>,
    pub config: Arc<Config>,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    ensure_first_superuser(&db, &config).await?;

    let purged = db.delete_expired_tokens().await?;
    if purged > 0 {
        tracing::info!("Purged {} expired access tokens", purged);
    }

    let cache = match config.quiz_cache {
        CacheBackend::Memory => {
            tracing::info!("Using in-memory quiz cache");
            QuizCache::Memory(MemoryQuizCache::new(config.quiz_cache_ttl))
        }
        CacheBackend::S3 => {
            tracing::info!("Initializing S3 quiz cache...");
            QuizCache::S3(S3QuizCache::from_env().await?)
        }
    };

    let addr = config.bind_addr();
    let state = AppState {
        db: Arc::new(db),
        cache: Arc::new(cache),
        config: Arc::new(config),
    };

    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // User routes
        .route("/api/users", get(routes::users::list))
        .route(
            "/api/users/me",
            get(routes::users::me)
                .put(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        // Item routes
        .route(
            "/api/items",
            get(routes::items::list).post(routes::items::create),
        )
        .route("/api/items/import", post(routes::items::import))
        .route(
            "/api/items/{item_id}",
            get(routes::items::get_one)
                .put(routes::items::update)
                .delete(routes::items::remove),
        )
        // Deck routes
        .route(
            "/api/decks",
            get(routes::decks::list).post(routes::decks::create),
        )
        .route(
            "/api/decks/{deck_id}",
            put(routes::decks::rename).delete(routes::decks::remove),
        )
        .route(
            "/api/decks/{deck_id}/items",
            get(routes::decks::items).post(routes::decks::create_item),
        )
        .route(
            "/api/decks/{deck_id}/items/{item_id}",
            put(routes::decks::attach_item).delete(routes::decks::detach_item),
        )
        // Quiz routes
        .route(
            "/api/quizzes",
            get(routes::quizzes::list).post(routes::quizzes::create),
        )
        .route("/api/quizzes/{quiz_id}", post(routes::quizzes::submit))
        .route("/api/quizzes/{quiz_id}/items", get(routes::quizzes::items))
        .route(
            "/api/quizzes/{quiz_id}/questions/{question_number}",
            get(routes::quizzes::question),
        )
        .route(
            "/api/quizzes/{quiz_id}/questions/{question_number}/answer",
            get(routes::quizzes::answer),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .route(
            "/api/login/access-token",
            post(routes::users::login_access_token),
        )
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Create the configured superuser if no user by that name exists.
pub async fn ensure_first_superuser(db: &Database, config: &Config) -> error::Result<()> {
    let Some(superuser) = &config.first_superuser else {
        return Ok(());
    };

    if db.get_user_by_name(&superuser.user_name).await?.is_some() {
        return Ok(());
    }

    let request = UserRegisterRequest {
        user_name: superuser.user_name.clone(),
        email: superuser.email.clone(),
        password: superuser.password.clone(),
        full_name: None,
    };
    let password_hash = hash_password(&request.password)?;
    db.create_user(&request, &password_hash, true).await?;

    tracing::info!("Created first superuser: {}", superuser.user_name);
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
