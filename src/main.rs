use std::sync::Arc;

use anyhow::Context;

use alliance_hub::auth::provider::HttpAuthProvider;
use alliance_hub::{config, database, handlers, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Alliance Hub in {:?} mode", config.environment);

    let db = database::connect().await.context("database connection failed")?;

    let auth =
        HttpAuthProvider::from_config(&config.auth_api).context("auth provider setup failed")?;

    let state = AppState {
        db,
        auth: Arc::new(auth),
    };

    let app = handlers::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("HUB_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("Alliance Hub listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
