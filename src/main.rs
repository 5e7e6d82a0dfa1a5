mod config;
mod db;
mod error;
mod handlers;
mod models;
mod store;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::Config;
pub use error::{AppError, Result};

use db::ConnectionHolder;
use store::MediaStore;

pub struct AppState {
    pub store: Arc<dyn MediaStore>,
    pub config: Config,
    pub http: reqwest::Client,
}

pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    // Uploads are unbounded unless a cap is configured.
    let body_limit = match config.max_request_body_bytes() {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Diagnostics
        .route("/health", get(handlers::health_check))
        .route("/test_connection", get(handlers::test_connection))
        .route("/my-ip", get(handlers::my_ip))
        // Media
        .route("/upload_sprite", post(handlers::media::upload_sprite))
        .route("/upload_audio", post(handlers::media::upload_audio))
        .route("/sprites", get(handlers::media::list_sprites))
        .route("/audio", get(handlers::media::list_audio))
        .route("/sprite/:filename", get(handlers::media::get_sprite))
        .route("/audio/:filename", get(handlers::media::get_audio))
        // Scores
        .route("/player_score", post(handlers::scores::add_score))
        .route("/player_scores", get(handlers::scores::list_scores))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // A second install fails, which ends the process here.
    let connection = ConnectionHolder::global()
        .install(
            &config.mongo_uri(),
            &config.mongo_database,
            config.credentials(),
        )
        .await?;

    tracing::info!(
        "Using database '{}' as '{}'",
        connection.database().name(),
        connection.username()
    );

    if let Err(e) = connection.ping().await {
        tracing::warn!("MongoDB ping failed, continuing anyway: {}", e);
    }

    let state = Arc::new(AppState {
        store: connection,
        config: config.clone(),
        http: reqwest::Client::new(),
    });

    let app = build_router(state, &config);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
