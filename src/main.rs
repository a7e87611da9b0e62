use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod crypto;
mod db;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use db::{Database, MemoryStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rockchain_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting {} backend", config.app_name);
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn Store> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; state is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let db = Database::new(&config).await?;

        tracing::info!("Running database migrations...");
        db.run_migrations().await?;
        Arc::new(db)
    };

    let app_state = api::AppState::new(store.clone(), config.clone())?;

    // Build router
    let app = build_router(app_state);

    // Start background services
    tokio::spawn(services::start_background_services(store, config.clone()));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Profile
        .route("/api/user/upsert", post(api::user::upsert_user))
        // Signed message templates
        .route("/api/message/prepare", post(api::message::prepare_message))
        // Claims
        .route("/api/claim/daily", post(api::claim::claim_daily))
        .route("/api/claim/referral", post(api::claim::claim_referral))
        // Games
        .route("/api/game/result", post(api::game::submit_game_result))
        // Leaderboard
        .route(
            "/api/leaderboard/top",
            get(api::leaderboard::get_leaderboard),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
