//! Tariff tables and the per-family walk that extracts a base price.
//!
//! Table shapes by [`ProductFamily`]:
//!
//! ```text
//! DomesticTwoTier          tariffs.<group>[.<sub-format>].<bracket>
//! DomesticSingleTier       tariffs.<group>.<bracket>
//! InternationalRegistered  tariffs.<zone>.<group>.<bracket>
//! International            tariffs.<zone>.<format>.<bracket>
//! ```
//!
//! `<group>` is `standard` or `non-standard`, `<bracket>` is the bracket's
//! upper bound in grams and leaves are prices in cents.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::catalog::formats;
use crate::error::{QuoteError, QuoteResult};
use crate::models::{ProductCode, ProductFamily, WeightBracket, Zone};

/// A node of a tariff document.
///
/// Anything that is neither an integer nor an object is kept as `Other` so a
/// stray value only breaks the lookups that reach it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TariffNode {
    Price(i64),
    Branch(BTreeMap<String, TariffNode>),
    Other(serde_json::Value),
}

impl TariffNode {
    fn child(&self, key: &str) -> Option<&TariffNode> {
        match self {
            Self::Branch(children) => children.get(key),
            _ => None,
        }
    }

    fn has_sub_formats(&self) -> bool {
        formats::SUB_FORMATS
            .iter()
            .any(|sub| self.child(sub).is_some())
    }
}

/// A product's tariff document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TariffTable {
    /// Regulatory notes surfaced verbatim in every quote
    pub notes: String,
    pub tariffs: TariffNode,
}

/// What to do when a two-tier request names only the coarse group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubFormatPolicy {
    /// Use the `small` sub-format
    #[default]
    DefaultToSmall,
    /// Reject the request as `INVALID_INPUT`
    Strict,
}

impl SubFormatPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::DefaultToSmall }
    }
}

/// Resolved inputs of a tariff lookup
#[derive(Debug, Clone, Copy)]
pub struct TariffQuery<'a> {
    pub product: ProductCode,
    pub family: ProductFamily,
    pub format: &'a str,
    pub zone: Option<Zone>,
    pub bracket: WeightBracket,
    pub weight_grams: i64,
}

/// Coarse group of a single-tier format
fn coarse_group(format: &str) -> Option<&'static str> {
    match format {
        formats::STANDARD => Some(formats::STANDARD),
        formats::NON_STANDARD => Some(formats::NON_STANDARD),
        _ => None,
    }
}

/// Group and explicit sub-format of a two-tier format
fn two_tier_path(format: &str) -> Option<(&'static str, Option<&'static str>)> {
    match format {
        formats::STANDARD => Some((formats::STANDARD, None)),
        formats::NON_STANDARD => Some((formats::NON_STANDARD, None)),
        formats::SMALL => Some((formats::STANDARD, Some(formats::SMALL))),
        formats::MEDIUM => Some((formats::STANDARD, Some(formats::MEDIUM))),
        formats::EXTRA => Some((formats::STANDARD, Some(formats::EXTRA))),
        _ => None,
    }
}

impl TariffTable {
    /// Base price in cents for the resolved combination
    pub fn base_price(&self, query: &TariffQuery<'_>, policy: SubFormatPolicy) -> QuoteResult<i64> {
        let brackets = match query.family {
            ProductFamily::DomesticTwoTier => self.two_tier_brackets(query, policy)?,
            ProductFamily::DomesticSingleTier => {
                let group = coarse_group(query.format)
                    .ok_or_else(|| not_found(query, "format has no tariff group".to_string()))?;
                step(&self.tariffs, group, query)?
            }
            ProductFamily::InternationalRegistered => {
                let zone_node = step(&self.tariffs, zone_key(query)?, query)?;
                let group = coarse_group(query.format)
                    .ok_or_else(|| not_found(query, "format has no tariff group".to_string()))?;
                step(zone_node, group, query)?
            }
            ProductFamily::International => {
                let zone_node = step(&self.tariffs, zone_key(query)?, query)?;
                step(zone_node, query.format, query)?
            }
        };

        let key = query.bracket.table_key();
        match step(brackets, &key, query)? {
            TariffNode::Price(cents) => Ok(*cents),
            _ => Err(not_found(query, format!("entry '{key}' is not a price"))),
        }
    }

    fn two_tier_brackets<'t>(
        &'t self,
        query: &TariffQuery<'_>,
        policy: SubFormatPolicy,
    ) -> QuoteResult<&'t TariffNode> {
        let (group, sub_format) = two_tier_path(query.format)
            .ok_or_else(|| not_found(query, "format has no tariff group".to_string()))?;
        let group_node = step(&self.tariffs, group, query)?;

        match sub_format {
            Some(sub) => step(group_node, sub, query),
            None if group_node.has_sub_formats() => match policy {
                SubFormatPolicy::DefaultToSmall => step(group_node, formats::SMALL, query),
                SubFormatPolicy::Strict => Err(QuoteError::invalid_input(
                    format!(
                        "format '{}' of {} requires a sub-format ({})",
                        query.format,
                        query.product,
                        formats::SUB_FORMATS.join(", ")
                    ),
                    "format",
                    serde_json::Value::from(query.format),
                )),
            },
            None => Ok(group_node),
        }
    }
}

fn zone_key(query: &TariffQuery<'_>) -> QuoteResult<&'static str> {
    query
        .zone
        .map(|zone| zone.as_str())
        .ok_or_else(|| not_found(query, "international tariff needs a zone".to_string()))
}

fn step<'t>(node: &'t TariffNode, key: &str, query: &TariffQuery<'_>) -> QuoteResult<&'t TariffNode> {
    node.child(key)
        .ok_or_else(|| not_found(query, format!("missing key '{key}'")))
}

fn not_found(query: &TariffQuery<'_>, reason: String) -> QuoteError {
    QuoteError::TariffNotFound {
        product: query.product,
        format: query.format.to_string(),
        weight_grams: query.weight_grams,
        zone: query.zone,
        reason,
    }
}
