use crate::{env_or_default, ConfigError, FromEnv};
use std::net::Ipv4Addr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Listener and shutdown settings for the rates API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// `host:port`, as passed to the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        })
}

impl FromEnv for ServerConfig {
    /// Reads:
    /// - HOST: defaults to 0.0.0.0
    /// - PORT: defaults to 8080
    /// - SHUTDOWN_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = parse_var("PORT", &DEFAULT_PORT.to_string())?;
        let shutdown_secs: u64 = parse_var(
            "SHUTDOWN_TIMEOUT_SECS",
            &DEFAULT_SHUTDOWN_TIMEOUT_SECS.to_string(),
        )?;

        Ok(Self {
            host,
            port,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: DEFAULT_PORT,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 3] = ["HOST", "PORT", "SHUTDOWN_TIMEOUT_SECS"];

    #[test]
    fn test_unset_vars_match_default() {
        temp_env::with_vars_unset(VARS, || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config, ServerConfig::default());
            assert_eq!(config.address(), "0.0.0.0:8080");
            assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        });
    }

    #[test]
    fn test_loopback_listener_with_short_drain() {
        temp_env::with_vars(
            [
                ("HOST", Some("127.0.0.1")),
                ("PORT", Some(" 3000 ")),
                ("SHUTDOWN_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.address(), "127.0.0.1:3000");
                assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_rate_table_vars_do_not_leak_into_server_config() {
        temp_env::with_vars(
            [
                ("HOST", None),
                ("PORT", None),
                ("SHUTDOWN_TIMEOUT_SECS", None),
                ("RATE_TABLES_DIR", Some("/srv/tables")),
                ("RATES_WARM_UP", Some("false")),
            ],
            || {
                assert_eq!(ServerConfig::from_env().unwrap(), ServerConfig::default());
            },
        );
    }

    #[test]
    fn test_bad_values_name_their_variable() {
        for (key, value) in [
            ("PORT", "not_a_number"),
            ("PORT", "99999"),
            ("SHUTDOWN_TIMEOUT_SECS", "-1"),
        ] {
            temp_env::with_var(key, Some(value), || {
                let err = ServerConfig::from_env().unwrap_err();
                assert!(err.to_string().contains(key), "{key}={value}: {err}");
            });
        }
    }
}
