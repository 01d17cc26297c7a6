//! Postal Rates API - REST server

use core_config::tracing::{init_tracing, install_color_eyre};
use rates_api::config::Config;
use rates_api::{build_service, server};
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    observability::init_metrics();

    let service = build_service(&config.rates)?;
    let app = server::app(service, config.app, config.cors_allowed_origin.as_deref())?;

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    server::serve(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Rates API shutdown complete");
    Ok(())
}
