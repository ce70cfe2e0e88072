// Main entry point - dependency injection and session setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use crate::application::resolver::resolve_root;
use crate::application::session::DashboardSession;
use crate::infrastructure::config::load_platform_config;
use crate::infrastructure::rest_history::RestHistoryRepository;
use crate::infrastructure::ws::subscription::SubscriptionManager;
use crate::presentation::console::ConsoleSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_platform_config()?;

    // Resolve the root entity from the configured datasources
    let selection = match resolve_root(&config.datasources) {
        Ok(selection) => selection,
        Err(e) => {
            tracing::error!(error = %e, "cannot start without a root entity");
            return Ok(());
        }
    };

    // Create repository (infrastructure layer)
    let history = Arc::new(RestHistoryRepository::new(
        config.platform.http_base_url.clone(),
        config.platform.jwt_token.clone(),
    ));

    // Create the session (application layer) with a console sink
    let mut session = DashboardSession::new(selection.clone(), history, Arc::new(ConsoleSink));

    // Seed the trend chart before going live; failure here is non-fatal
    session.load_history().await;

    // Open the push channel and drive it until it closes or we are stopped
    let mut subscription = SubscriptionManager::open(
        &config.platform.ws_base_url,
        &config.platform.jwt_token,
        &selection,
    )
    .await?;

    tokio::select! {
        _ = session.run(&mut subscription) => {
            tracing::info!("push channel closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    session.shutdown();
    subscription.close().await;

    Ok(())
}
