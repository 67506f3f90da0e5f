//! Qaree Gateway relay server
//!
//! Serves the same-origin relay endpoint that untrusted clients post their
//! GraphQL requests to.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use qaree_gateway::config::GatewayConfig;
use qaree_gateway::dispatch::{Dispatcher, HttpTransport};
use qaree_gateway::server::{run_server, AppState};
use qaree_gateway::session::SessionStore;
use qaree_gateway::utils::otel::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;
    let _guard = init_telemetry("qaree-gateway", config.otlp)?;

    info!(
        backend = %config.backend_url,
        sign_in = %config.sign_in_path,
        "Starting Qaree gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    let transport = HttpTransport::with_connect_timeout(config.connect_timeout)
        .context("Failed to build HTTP client")?;
    let dispatcher = Dispatcher::from_config(Arc::new(transport), &config);

    let state = AppState {
        dispatcher,
        sessions: SessionStore::new(),
        sign_in_path: config.sign_in_path.clone(),
    };

    run_server(state, &config.bind_addr).await
}
