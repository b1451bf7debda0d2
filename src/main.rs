use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use course_advisor::AdvisorService;
use course_advisor::config::Config;
use course_advisor::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();

    // No credential, no service: halt before anything is served.
    let service = Arc::new(
        AdvisorService::new(&config).context("Completion API credential is not usable")?,
    );

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server bind address '{}'", config.server.bind))?;

    let bearer_token = config.server.bearer_token.clone();
    let router = server::router(service, bearer_token.clone());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        %bind,
        auth = %bearer_token.as_deref().map(|_| "bearer").unwrap_or("none"),
        "Starting course advisor HTTP server"
    );

    axum::serve(listener, router).await?;
    tracing::info!("Server shutting down");
    Ok(())
}
