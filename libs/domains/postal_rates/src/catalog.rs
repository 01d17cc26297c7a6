//! Static product catalog and format gating.

use serde::Serialize;
use std::fmt;

use crate::models::{ProductCode, ProductFamily};

/// Format codes as they appear in requests and tariff tables
pub mod formats {
    pub const STANDARD: &str = "standard";
    pub const NON_STANDARD: &str = "non-standard";
    pub const SMALL: &str = "small";
    pub const MEDIUM: &str = "medium";
    pub const EXTRA: &str = "extra";
    pub const LETTER: &str = "letter";
    pub const LARGE_LETTER: &str = "large-letter";
    pub const SMALL_PACKET: &str = "small-packet";

    /// Sub-formats nested under a coarse group in two-tier tables
    pub const SUB_FORMATS: &[&str] = &[SMALL, MEDIUM, EXTRA];
}

const TWO_TIER_FORMATS: &[&str] = &[
    formats::STANDARD,
    formats::NON_STANDARD,
    formats::SMALL,
    formats::MEDIUM,
    formats::EXTRA,
];
const GROUP_FORMATS: &[&str] = &[formats::STANDARD, formats::NON_STANDARD];
const INTERNATIONAL_FORMATS: &[&str] = &[
    formats::LETTER,
    formats::LARGE_LETTER,
    formats::SMALL_PACKET,
];

/// Identifier of a tariff table document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TariffId(&'static str);

impl TariffId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TariffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Catalog entry for one product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSpec {
    pub product: ProductCode,
    pub family: ProductFamily,
    pub tariff_id: TariffId,
    pub formats: &'static [&'static str],
}

impl ProductSpec {
    pub fn allows(&self, format: &str) -> bool {
        self.formats.contains(&format)
    }
}

pub static CATALOG: [ProductSpec; 6] = [
    ProductSpec {
        product: ProductCode::Posta1,
        family: ProductFamily::DomesticTwoTier,
        tariff_id: TariffId::new("posta1"),
        formats: TWO_TIER_FORMATS,
    },
    ProductSpec {
        product: ProductCode::Posta4,
        family: ProductFamily::DomesticTwoTier,
        tariff_id: TariffId::new("posta4"),
        formats: TWO_TIER_FORMATS,
    },
    ProductSpec {
        product: ProductCode::Raccomandata,
        family: ProductFamily::DomesticSingleTier,
        tariff_id: TariffId::new("raccomandata"),
        formats: GROUP_FORMATS,
    },
    ProductSpec {
        product: ProductCode::Raccomandata1,
        family: ProductFamily::DomesticSingleTier,
        tariff_id: TariffId::new("raccomandata1"),
        formats: GROUP_FORMATS,
    },
    ProductSpec {
        product: ProductCode::PostaInternazionale,
        family: ProductFamily::International,
        tariff_id: TariffId::new("posta_internazionale"),
        formats: INTERNATIONAL_FORMATS,
    },
    ProductSpec {
        product: ProductCode::RaccomandataInternazionale,
        family: ProductFamily::InternationalRegistered,
        tariff_id: TariffId::new("raccomandata_internazionale"),
        formats: GROUP_FORMATS,
    },
];

/// Catalog entry for `product`
pub fn product_spec(product: ProductCode) -> &'static ProductSpec {
    match product {
        ProductCode::Posta1 => &CATALOG[0],
        ProductCode::Posta4 => &CATALOG[1],
        ProductCode::Raccomandata => &CATALOG[2],
        ProductCode::Raccomandata1 => &CATALOG[3],
        ProductCode::PostaInternazionale => &CATALOG[4],
        ProductCode::RaccomandataInternazionale => &CATALOG[5],
    }
}

/// Whether `format` is legal for `product`. Unknown products allow nothing.
pub fn is_format_allowed(product: &str, format: &str) -> bool {
    product
        .parse::<ProductCode>()
        .map(|product| product_spec(product).allows(format))
        .unwrap_or(false)
}
