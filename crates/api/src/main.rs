use std::env;

use anyhow::{Context, Result};
use tracing::{info, warn};
use travelwise_api::build_app;
use travelwise_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("travelwise_api");

    let data_root = env::var("TRAVELWISE_DATA_ROOT").unwrap_or_else(|_| "data".to_string());
    let bind = env::var("TRAVELWISE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let persistence = if env::var_os("TRAVELWISE_DATABASE_URL").is_some() {
        "sqlite"
    } else {
        "memory"
    };
    let allowed_origins = env::var("TRAVELWISE_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "localhost defaults".to_string());
    info!(
        data_root = %data_root,
        persistence,
        places_key = env::var_os("TRAVELWISE_PLACES_API_KEY").is_some(),
        gemini_key = env::var_os("TRAVELWISE_GEMINI_API_KEY").is_some(),
        allowed_origins = %allowed_origins,
        "loading travelwise settings"
    );
    if env::var_os("TRAVELWISE_API_KEY").is_none() {
        warn!("TRAVELWISE_API_KEY is unset, serving with the development api key");
    }

    let app = build_app(&data_root).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(bind = %bind, "travelwise api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
