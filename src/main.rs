use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use paste_and_post::caption::Captioner;
use paste_and_post::config::Config;
use paste_and_post::extract::Extractor;
use paste_and_post::llm_client::GroqClient;
use paste_and_post::routes::build_router;
use paste_and_post::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.rust_log.as_str().into()),
        )
        .init();

    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY is not set; caption generation will fail");
    }

    let extractor = Extractor::new().context("failed to build page fetch client")?;
    let llm = GroqClient::new(config.groq_api_key.clone(), config.groq_api_base.clone())
        .context("failed to build completion client")?;
    let state = AppState::new(extractor, Captioner::new(Arc::new(llm)));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr()))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
