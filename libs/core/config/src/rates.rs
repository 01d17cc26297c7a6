use crate::{env_flag, ConfigError, FromEnv};
use std::env;
use std::path::PathBuf;

/// Where rate tables come from and how strictly requests are read
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateTablesConfig {
    /// Directory of `<table>.json` documents; embedded tables when `None`
    pub tables_dir: Option<PathBuf>,
    /// Reject coarse two-tier formats instead of defaulting to `small`
    pub strict_sub_format: bool,
    /// Load every tariff table at startup
    pub warm_up: bool,
}

impl FromEnv for RateTablesConfig {
    /// Reads from environment variables:
    /// - RATE_TABLES_DIR: optional, blank means embedded tables
    /// - RATES_STRICT_SUBFORMAT: defaults to false
    /// - RATES_WARM_UP: defaults to true
    fn from_env() -> Result<Self, ConfigError> {
        let tables_dir = env::var("RATE_TABLES_DIR")
            .ok()
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            tables_dir,
            strict_sub_format: env_flag("RATES_STRICT_SUBFORMAT", false)?,
            warm_up: env_flag("RATES_WARM_UP", true)?,
        })
    }
}

impl Default for RateTablesConfig {
    fn default() -> Self {
        Self {
            tables_dir: None,
            strict_sub_format: false,
            warm_up: true,
        }
    }
}
