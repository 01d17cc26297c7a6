use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

use crate::error::{QuoteError, QuoteResult};
use crate::models::{ProductCode, QuoteOptions};

/// Optional services that add a fixed surcharge
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceOption {
    /// Return receipt (avviso di ricevimento)
    Ar,
    /// Proof of delivery (prova di consegna)
    Pdd,
}

impl ServiceOption {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ar => "Return receipt",
            Self::Pdd => "Proof of delivery",
        }
    }
}

/// Pricing and availability of one option
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionRule {
    /// Fixed surcharge; `None` means the option is free and leaves no breakdown line
    #[serde(default)]
    pub cents: Option<i64>,
    /// Products the option is restricted to; `None` means every product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_products: Option<Vec<ProductCode>>,
}

impl OptionRule {
    pub fn supports(&self, product: ProductCode) -> bool {
        self.supported_products
            .as_ref()
            .is_none_or(|products| products.contains(&product))
    }
}

/// The options document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptionsConfig {
    #[serde(default)]
    pub ar: OptionRule,
    #[serde(default)]
    pub pdd: OptionRule,
}

impl OptionsConfig {
    pub fn rule(&self, option: ServiceOption) -> &OptionRule {
        match option {
            ServiceOption::Ar => &self.ar,
            ServiceOption::Pdd => &self.pdd,
        }
    }

    /// Options `product` may request
    pub fn available_for(&self, product: ProductCode) -> Vec<ServiceOption> {
        ServiceOption::iter()
            .filter(|option| self.rule(*option).supports(product))
            .collect()
    }

    /// Surcharges for the requested options, in evaluation order.
    ///
    /// Options without a configured surcharge are checked for support but
    /// produce no entry.
    pub fn surcharges(
        &self,
        product: ProductCode,
        requested: &QuoteOptions,
    ) -> QuoteResult<Vec<(ServiceOption, i64)>> {
        let mut applied = Vec::new();
        for option in requested.requested() {
            let rule = self.rule(option);
            if !rule.supports(product) {
                return Err(QuoteError::OptionNotSupported { option, product });
            }
            if let Some(cents) = rule.cents {
                applied.push((option, cents));
            }
        }
        Ok(applied)
    }
}
