//! Postal Rates API
//!
//! REST front end for the quote engine in `domain_postal_rates`.

pub mod config;
pub mod health;
pub mod openapi;
pub mod server;

use core_config::rates::RateTablesConfig;
use domain_postal_rates::{table_source, QuoteService, RateTableSource, SubFormatPolicy};
use eyre::WrapErr;
use tracing::{info, warn};

/// Quote service over the configured tables
pub type RatesService = QuoteService<Box<dyn RateTableSource>>;

/// Build the quote service described by `config`.
///
/// Zone and options tables are required up front. Tariff tables are loaded
/// now when warm-up is enabled, otherwise on first use.
pub fn build_service(config: &RateTablesConfig) -> eyre::Result<RatesService> {
    let source = table_source(config.tables_dir.as_deref());
    let service = QuoteService::from_source(source)
        .wrap_err("Failed to load zone and options tables")?
        .with_sub_format_policy(SubFormatPolicy::from_strict(config.strict_sub_format));

    info!(
        source = %service.source_description(),
        strict_sub_format = config.strict_sub_format,
        "Quote service configured"
    );

    if config.warm_up {
        let failures = service.warm_up();
        for (table, err) in &failures {
            warn!(table = %table, error = %err, "Tariff table failed to load during warm-up");
        }
        info!(
            loaded = service.catalog().len() - failures.len(),
            failed = failures.len(),
            "Tariff warm-up complete"
        );
    }

    Ok(service)
}
