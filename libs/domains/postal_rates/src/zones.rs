use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{QuoteError, QuoteResult};
use crate::models::Zone;

/// Country (ISO-3166 alpha-2) to pricing zone map.
///
/// Keys are upper-cased on construction so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Zone>")]
pub struct ZoneMap {
    countries: BTreeMap<String, Zone>,
}

impl From<BTreeMap<String, Zone>> for ZoneMap {
    fn from(raw: BTreeMap<String, Zone>) -> Self {
        raw.into_iter().collect()
    }
}

impl<K: AsRef<str>> FromIterator<(K, Zone)> for ZoneMap {
    fn from_iter<I: IntoIterator<Item = (K, Zone)>>(iter: I) -> Self {
        let countries = iter
            .into_iter()
            .map(|(country, zone)| (normalize(country.as_ref()), zone))
            .collect();
        Self { countries }
    }
}

fn normalize(country: &str) -> String {
    country.trim().to_ascii_uppercase()
}

impl ZoneMap {
    /// Zone for `country`, or `ZONE_NOT_FOUND` carrying the code as given
    pub fn resolve(&self, country: &str) -> QuoteResult<Zone> {
        self.countries
            .get(&normalize(country))
            .copied()
            .ok_or_else(|| QuoteError::ZoneNotFound {
                country_iso2: country.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Countries mapped to `zone`, sorted
    pub fn countries_in(&self, zone: Zone) -> Vec<&str> {
        self.countries
            .iter()
            .filter(|(_, z)| **z == zone)
            .map(|(country, _)| country.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteErrorCode;
    use proptest::prelude::*;
    use serde_json::json;

    fn fixture() -> ZoneMap {
        [("FR", Zone::Zone1), ("us", Zone::Zone2), ("AU", Zone::Zone3)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let zones = fixture();
        assert_eq!(zones.resolve("fr").unwrap(), Zone::Zone1);
        assert_eq!(zones.resolve("FR").unwrap(), Zone::Zone1);
        assert_eq!(zones.resolve("US").unwrap(), Zone::Zone2);
        assert_eq!(zones.resolve(" au ").unwrap(), Zone::Zone3);
    }

    #[test]
    fn test_unmapped_country_keeps_original_code() {
        let err = fixture().resolve("xx").unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::ZoneNotFound);
        assert_eq!(err.context().unwrap()["countryIso2"], json!("xx"));
    }

    #[test]
    fn test_deserialize_normalizes_keys() {
        let zones: ZoneMap =
            serde_json::from_value(json!({"de": "ZONE_1", "JP": "ZONE_2"})).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.countries_in(Zone::Zone1), vec!["DE"]);
    }

    #[test]
    fn test_unknown_zone_name_fails_to_parse() {
        let result: Result<ZoneMap, _> = serde_json::from_value(json!({"DE": "ZONE_9"}));
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn test_lookup_ignores_case(code in "[a-zA-Z]{2}") {
            let zones = fixture();
            let lower = zones.resolve(&code.to_lowercase()).ok();
            let upper = zones.resolve(&code.to_uppercase()).ok();
            prop_assert_eq!(lower, upper);
        }
    }
}
