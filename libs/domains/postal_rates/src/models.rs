use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;
use validator::Validate;

use crate::options::ServiceOption;

/// Shipping products that can be quoted
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum ProductCode {
    /// Priority domestic letter mail
    #[serde(rename = "POSTA1")]
    #[strum(serialize = "POSTA1")]
    Posta1,
    /// Ordinary domestic letter mail
    #[serde(rename = "POSTA4")]
    #[strum(serialize = "POSTA4")]
    Posta4,
    /// Domestic registered mail
    #[serde(rename = "RACCOMANDATA")]
    #[strum(serialize = "RACCOMANDATA")]
    Raccomandata,
    /// Domestic registered mail, next-day delivery
    #[serde(rename = "RACCOMANDATA1")]
    #[strum(serialize = "RACCOMANDATA1")]
    Raccomandata1,
    /// International letter mail
    #[serde(rename = "POSTA_INTERNAZIONALE")]
    #[strum(serialize = "POSTA_INTERNAZIONALE")]
    PostaInternazionale,
    /// International registered mail
    #[serde(rename = "RACCOMANDATA_INTERNAZIONALE")]
    #[strum(serialize = "RACCOMANDATA_INTERNAZIONALE")]
    RaccomandataInternazionale,
}

/// Shape of a product's tariff table; decides how the table is walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductFamily {
    /// `group -> [sub-format ->] bracket`
    DomesticTwoTier,
    /// `group -> bracket`
    DomesticSingleTier,
    /// `zone -> group -> bracket`
    InternationalRegistered,
    /// `zone -> format -> bracket`
    International,
}

impl ProductFamily {
    pub fn is_international(&self) -> bool {
        matches!(self, Self::International | Self::InternationalRegistered)
    }
}

/// International pricing zone
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum Zone {
    /// Europe and the Mediterranean basin
    #[serde(rename = "ZONE_1")]
    #[strum(serialize = "ZONE_1")]
    Zone1,
    /// Africa, Asia and the Americas
    #[serde(rename = "ZONE_2")]
    #[strum(serialize = "ZONE_2")]
    Zone2,
    /// Oceania
    #[serde(rename = "ZONE_3")]
    #[strum(serialize = "ZONE_3")]
    Zone3,
}

impl Zone {
    /// Key used for this zone in tariff tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zone1 => "ZONE_1",
            Self::Zone2 => "ZONE_2",
            Self::Zone3 => "ZONE_3",
        }
    }
}

/// Quote currency. Every amount is an integer in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
}

/// Where the shipment goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum Destination {
    #[serde(rename = "ITALY")]
    Italy,
    #[serde(rename = "INTL")]
    Intl {
        #[serde(rename = "countryIso2")]
        country_iso2: String,
    },
}

impl Destination {
    pub fn is_international(&self) -> bool {
        matches!(self, Self::Intl { .. })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Italy => "ITALY",
            Self::Intl { .. } => "INTL",
        }
    }
}

/// Optional services requested alongside the shipment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuoteOptions {
    /// Return receipt
    #[serde(default)]
    pub ar: bool,
    /// Proof of delivery
    #[serde(default)]
    pub pdd: bool,
}

impl QuoteOptions {
    pub fn is_requested(&self, option: ServiceOption) -> bool {
        match option {
            ServiceOption::Ar => self.ar,
            ServiceOption::Pdd => self.pdd,
        }
    }

    /// Requested options in their fixed evaluation order
    pub fn requested(&self) -> impl Iterator<Item = ServiceOption> + '_ {
        ServiceOption::iter().filter(|option| self.is_requested(*option))
    }
}

/// A request for a price quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product: ProductCode,
    pub destination: Destination,
    #[validate(range(min = 1, message = "weight must be a positive number of grams"))]
    pub weight_grams: i64,
    #[validate(length(min = 1, message = "format is required"))]
    pub format: String,
    /// Accepted for compatibility, has no effect on pricing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homologation: Option<bool>,
    #[serde(default)]
    pub options: QuoteOptions,
}

impl QuoteRequest {
    pub fn new(
        product: ProductCode,
        destination: Destination,
        weight_grams: i64,
        format: impl Into<String>,
    ) -> Self {
        Self {
            product,
            destination,
            weight_grams,
            format: format.into(),
            homologation: None,
            options: QuoteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QuoteOptions) -> Self {
        self.options = options;
        self
    }
}

/// Weight range, in grams, that a price applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct WeightBracket {
    pub min: u32,
    pub max: u32,
}

impl WeightBracket {
    /// Key of this bracket inside a tariff table
    pub fn table_key(&self) -> String {
        self.max.to_string()
    }
}

/// Itemised quote amounts. Each option has its own fixed field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdd_cents: Option<i64>,
}

impl PriceBreakdown {
    pub fn with_base(base_cents: i64) -> Self {
        Self {
            base_cents,
            ..Default::default()
        }
    }

    pub fn record(&mut self, option: ServiceOption, cents: i64) {
        match option {
            ServiceOption::Ar => self.ar_cents = Some(cents),
            ServiceOption::Pdd => self.pdd_cents = Some(cents),
        }
    }

    /// Sum of every line, or `None` if it overflows
    pub fn total_cents(&self) -> Option<i64> {
        self.base_cents
            .checked_add(self.ar_cents.unwrap_or(0))?
            .checked_add(self.pdd_cents.unwrap_or(0))
    }
}

/// A priced quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub total_cents: i64,
    pub currency: Currency,
    pub breakdown: PriceBreakdown,
    /// `product/zone/format` or `product/format`
    pub product_code: String,
    pub weight_bracket: WeightBracket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    /// Regulatory notes of the tariff table, verbatim
    pub notes: String,
}
