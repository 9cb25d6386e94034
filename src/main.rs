use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salon_bot::config::AppConfig;
use salon_bot::db;
use salon_bot::db::store::SqliteBookingStore;
use salon_bot::handlers;
use salon_bot::services::ai::classifier::LlmClassifier;
use salon_bot::services::ai::ollama::OllamaProvider;
use salon_bot::services::clock::SystemClock;
use salon_bot::services::intent::{IntentClassifier, KeywordClassifier};
use salon_bot::services::sessions::InMemorySessionStore;
use salon_bot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let classifier: Box<dyn IntentClassifier> = match config.classifier.as_str() {
        "ollama" => {
            tracing::info!(
                "using Ollama intent classifier (url: {}, model: {})",
                config.ollama_url,
                config.ollama_model
            );
            Box::new(LlmClassifier::new(Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))))
        }
        _ => {
            tracing::info!("using keyword intent classifier");
            Box::new(KeywordClassifier)
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        bookings: Box::new(SqliteBookingStore::new(Arc::new(Mutex::new(conn)))),
        sessions: Box::new(InMemorySessionStore::new()),
        clock: Box::new(SystemClock),
        classifier,
        message_lock: tokio::sync::Mutex::new(()),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
