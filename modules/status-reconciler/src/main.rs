use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use athena_client::AthenaConnector;
use sheets_client::ServiceAccountTokenProvider;
use status_reconciler::telemetry::log_filter;
use status_reconciler::{live::LivePassTrigger, router, AppState, Config, TracingObserver};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::from_default_env())?)
        .init();

    info!("Status reconciler starting...");

    let config = Config::from_env();
    config.log_redacted();

    let connector = AthenaConnector::new(config.athena_settings()).await;
    let tokens = ServiceAccountTokenProvider::from_file(&config.google_service_account_path)?;
    info!(client_email = tokens.client_email(), "Loaded Sheets service account");

    let state = Arc::new(AppState {
        trigger: Arc::new(LivePassTrigger::new(&config, connector, Arc::new(tokens))),
        observer: Arc::new(TracingObserver),
    });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Status reconciler listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
