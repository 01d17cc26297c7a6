use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter used by the API when `RUST_LOG` is unset
pub const PRODUCTION_FILTER: &str = "info,tower_http=warn";
pub const DEVELOPMENT_FILTER: &str = "debug,domain_postal_rates=trace,hyper=info,tower_http=debug";

/// Filter used by command-line tools when `RUST_LOG` is unset.
///
/// Only warnings reach stderr so stdout stays machine-readable.
pub const CLI_FILTER: &str = "warn";

/// Install color-eyre: error locations shown, environment section hidden.
///
/// Call once at the top of `main`. Later calls are ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Default filter directives for a long-running service in `environment`
pub fn default_filter(environment: &Environment) -> &'static str {
    if environment.is_production() {
        PRODUCTION_FILTER
    } else {
        DEVELOPMENT_FILTER
    }
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize tracing for the rates API.
///
/// Production writes flattened JSON events without targets, so a quote span's
/// `product`, `format` and `weight_grams` land as top-level keys. Development
/// writes pretty, multi-line events with targets. Both install an `ErrorLayer`
/// so `eyre` reports carry the active span trace.
///
/// `RUST_LOG` replaces [`default_filter`] when set. A second call is a no-op.
pub fn init_tracing(environment: &Environment) {
    let filter = env_filter(default_filter(environment));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(()) => info!(environment = ?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized"),
    }
}

/// Initialize compact tracing on stderr for command-line tools
pub fn init_cli_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_error::ErrorLayer::default())
        .with(env_filter(CLI_FILTER))
        .try_init();
}
