//! Configuration for the Rates API

use core_config::{app_info, rates::RateTablesConfig, server::ServerConfig, AppInfo, FromEnv};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub rates: RateTablesConfig,
    pub environment: Environment,
    /// Comma-separated origins; CORS is disabled when unset
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let rates = RateTablesConfig::from_env()?;

        let cors_allowed_origin = std::env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .filter(|origins| !origins.trim().is_empty());

        Ok(Self {
            app: app_info!(),
            server,
            rates,
            environment,
            cors_allowed_origin,
        })
    }
}
