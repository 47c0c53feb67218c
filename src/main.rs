mod config;

use anyhow::Context as _;
use axum::Router;
use clap::Parser as _;
use config::Config;
use jenet_api::{AppState, build_router};
use tokio::net::TcpListener;
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
pub async fn main() -> anyhow::Result<()> {
    // A missing .env is the normal case outside local development.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse().validate()?;
    info!("Starting jenet-api with config: {:?}", config);

    let app_state = AppState::new(
        config.completion_settings(),
        config.origin_policy(),
        config.pool(),
    );
    let router = build_router(app_state);

    if config.local {
        serve_local(router, config.port).await
    } else {
        serve_lambda(router).await
    }
}

async fn serve_local(router: Router, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Local server listening on http://localhost:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

/// Hands the router to the Lambda runtime, which turns API Gateway events into
/// HTTP requests and our responses back into gateway responses.
async fn serve_lambda(router: Router) -> anyhow::Result<()> {
    info!("Running under the Lambda runtime");
    lambda_http::run(router)
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime exited with error: {e}"))
}
