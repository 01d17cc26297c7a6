//! Rates CLI
//!
//! Quotes shipments and inspects rate tables without running the API.
//! Output is JSON on stdout; failures exit with status 1.

use clap::{Parser, Subcommand};
use core_config::rates::RateTablesConfig;
use core_config::tracing::{init_cli_tracing, install_color_eyre};
use core_config::FromEnv;
use domain_postal_rates::{
    table_source, Destination, ProductCode, QuoteOptions, QuoteRequest, QuoteService,
    SubFormatPolicy,
};
use eyre::{Result, WrapErr};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "rates-cli")]
#[command(about = "Quote postal shipments from the configured rate tables")]
struct Cli {
    /// Read tables from this directory instead of the embedded ones (overrides RATE_TABLES_DIR)
    #[arg(long, global = true)]
    tables_dir: Option<PathBuf>,

    /// Require an explicit sub-format for two-tier products
    #[arg(long, global = true)]
    strict_sub_format: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a single shipment
    Quote {
        /// Product code, e.g. POSTA1 or RACCOMANDATA_INTERNAZIONALE
        #[arg(short, long)]
        product: ProductCode,

        /// Format code, e.g. standard, medium or letter
        #[arg(short, long)]
        format: String,

        /// Weight in grams
        #[arg(short, long, allow_negative_numbers = true)]
        weight: i64,

        /// Destination country (ISO-3166 alpha-2); omit for Italy
        #[arg(short, long)]
        country: Option<String>,

        /// Request a return receipt
        #[arg(long)]
        ar: bool,

        /// Request proof of delivery
        #[arg(long)]
        pdd: bool,
    },

    /// List products and their formats
    Products,

    /// Show the zone of a country
    Zone {
        /// ISO-3166 alpha-2 country code
        country: String,
    },

    /// Load every table and report failures
    Check,
}

fn main() -> ExitCode {
    install_color_eyre();

    let cli = Cli::parse();
    init_cli_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let env_config = RateTablesConfig::from_env()?;
    let tables_dir = cli.tables_dir.or(env_config.tables_dir);
    let strict = cli.strict_sub_format || env_config.strict_sub_format;

    let service = QuoteService::from_source(table_source(tables_dir.as_deref()))
        .wrap_err("Failed to load zone and options tables")?
        .with_sub_format_policy(SubFormatPolicy::from_strict(strict));
    info!(source = %service.source_description(), "Rate tables ready");

    match cli.command {
        Commands::Quote {
            product,
            format,
            weight,
            country,
            ar,
            pdd,
        } => {
            let destination = match country {
                Some(country_iso2) => Destination::Intl { country_iso2 },
                None => Destination::Italy,
            };
            let request = QuoteRequest::new(product, destination, weight, format)
                .with_options(QuoteOptions { ar, pdd });

            match service.quote(&request) {
                Ok(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&err.body())?);
                    eyre::bail!("quote failed with {}", err.code());
                }
            }
        }

        Commands::Products => {
            let products: Vec<_> = service
                .catalog()
                .iter()
                .map(|spec| {
                    json!({
                        "product": spec.product,
                        "family": spec.family,
                        "formats": spec.formats,
                        "options": service.options().available_for(spec.product),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&products)?);
        }

        Commands::Zone { country } => {
            let zone = service.zones().resolve(&country)?;
            println!("{}", json!({ "countryIso2": country.trim().to_ascii_uppercase(), "zone": zone }));
        }

        Commands::Check => {
            let failures = service.warm_up();
            for (table, err) in &failures {
                eprintln!("{}: {}", table, err);
            }
            println!(
                "{}",
                json!({
                    "source": service.source_description(),
                    "tables": service.catalog().len(),
                    "failed": failures.len(),
                    "countries": service.zones().len(),
                })
            );
            if !failures.is_empty() {
                eyre::bail!("{} tariff table(s) failed to load", failures.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quote_arguments_parse() {
        let cli = Cli::try_parse_from([
            "rates-cli", "quote", "--product", "RACCOMANDATA1", "--format", "standard", "--weight",
            "20", "--ar",
        ])
        .unwrap();

        match cli.command {
            Commands::Quote {
                product,
                weight,
                ar,
                pdd,
                country,
                ..
            } => {
                assert_eq!(product, ProductCode::Raccomandata1);
                assert_eq!(weight, 20);
                assert!(ar);
                assert!(!pdd);
                assert_eq!(country, None);
            }
            _ => panic!("expected quote command"),
        }
    }

    #[test]
    fn test_unknown_product_is_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "rates-cli", "quote", "-p", "POSTA9", "-f", "standard", "-w", "20",
        ]);
        assert!(result.is_err());
    }
}
