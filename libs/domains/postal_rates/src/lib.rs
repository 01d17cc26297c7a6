//! Postal Rates Domain
//!
//! Quotes Italian postal shipments from read-only tariff, zone and options
//! tables.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← HTTP routes, OpenAPI
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ QuoteService │  ← Validation, zone, weight, tariff, options
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ TariffCache  │  ← Write-once per table
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │    Source    │  ← Embedded or directory tables (trait)
//! └──────────────┘
//! ```
//!
//! A quote resolves in a fixed order and stops at the first error: request
//! validation and format gating, destination zone, tariff table, weight
//! bracket, base price, then option surcharges.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod models;
pub mod options;
pub mod service;
pub mod source;
pub mod tariff;
pub mod weight;
pub mod zones;

// Re-export commonly used types
pub use catalog::{is_format_allowed, product_spec, ProductSpec, TariffId, CATALOG};
pub use error::{QuoteError, QuoteErrorBody, QuoteErrorCode, QuoteResult};
pub use models::{
    Currency, Destination, PriceBreakdown, ProductCode, ProductFamily, Quote, QuoteOptions,
    QuoteRequest, WeightBracket, Zone,
};
pub use options::{OptionRule, OptionsConfig, ServiceOption};
pub use service::QuoteService;
pub use source::{table_source, DirectoryTables, EmbeddedTables, RateTableSource, TableLoadError};
pub use tariff::{SubFormatPolicy, TariffTable};
pub use weight::{resolve_weight_bracket, WEIGHT_BOUNDARIES};
pub use zones::ZoneMap;
