use observability::QuoteMetrics;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::cache::TariffCache;
use crate::catalog::{product_spec, ProductSpec, TariffId, CATALOG};
use crate::error::{QuoteError, QuoteResult};
use crate::models::{Currency, Destination, PriceBreakdown, Quote, QuoteRequest, Zone};
use crate::options::OptionsConfig;
use crate::source::{RateTableSource, TableLoadError};
use crate::tariff::{SubFormatPolicy, TariffQuery, TariffTable};
use crate::weight::{resolve_weight_bracket, WEIGHT_BOUNDARIES};
use crate::zones::ZoneMap;

/// Computes quotes against injected, read-only rate tables.
///
/// Each call works on its own locals; the only shared state is the tariff
/// cache, which is write-once per table.
pub struct QuoteService<S: RateTableSource> {
    source: Arc<S>,
    zones: Arc<ZoneMap>,
    options: Arc<OptionsConfig>,
    tariffs: Arc<TariffCache>,
    boundaries: Arc<[u32]>,
    policy: SubFormatPolicy,
}

impl<S: RateTableSource> Clone for QuoteService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            zones: Arc::clone(&self.zones),
            options: Arc::clone(&self.options),
            tariffs: Arc::clone(&self.tariffs),
            boundaries: Arc::clone(&self.boundaries),
            policy: self.policy,
        }
    }
}

impl<S: RateTableSource> QuoteService<S> {
    /// Create a service with explicit zone and options tables
    pub fn new(source: S, zones: ZoneMap, options: OptionsConfig) -> Self {
        Self {
            source: Arc::new(source),
            zones: Arc::new(zones),
            options: Arc::new(options),
            tariffs: Arc::new(TariffCache::for_catalog()),
            boundaries: Arc::from(WEIGHT_BOUNDARIES.as_slice()),
            policy: SubFormatPolicy::default(),
        }
    }

    /// Create a service, loading the zone and options tables from `source`
    pub fn from_source(source: S) -> Result<Self, TableLoadError> {
        let zones = source.load_zone_map()?;
        let options = source.load_options()?;
        info!(
            source = %source.describe(),
            countries = zones.len(),
            "Loaded zone map and options"
        );
        Ok(Self::new(source, zones, options))
    }

    pub fn with_sub_format_policy(mut self, policy: SubFormatPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the bracket boundaries; they must be sorted ascending
    pub fn with_weight_boundaries(mut self, boundaries: Vec<u32>) -> Self {
        debug_assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
        self.boundaries = Arc::from(boundaries);
        self
    }

    pub fn catalog(&self) -> &'static [ProductSpec] {
        &CATALOG
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn options(&self) -> &OptionsConfig {
        &self.options
    }

    pub fn sub_format_policy(&self) -> SubFormatPolicy {
        self.policy
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Price `request`, or return the first error hit along the way
    #[instrument(
        skip(self, request),
        fields(product = %request.product, format = %request.format, weight_grams = request.weight_grams)
    )]
    pub fn quote(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        let started = Instant::now();
        let product = request.product.to_string();
        let result = self.compute(request);

        match &result {
            Ok(quote) => {
                debug!(total_cents = quote.total_cents, product_code = %quote.product_code, "Quote computed");
                QuoteMetrics::record_quote(&product, quote.total_cents, started.elapsed());
            }
            Err(err) => {
                debug!(code = %err.code(), "Quote rejected: {}", err);
                QuoteMetrics::record_quote_error(&product, err.code().as_str(), started.elapsed());
            }
        }

        result
    }

    fn compute(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        let spec = self.validate(request)?;

        let zone = match &request.destination {
            Destination::Intl { country_iso2 } => Some(self.zones.resolve(country_iso2)?),
            Destination::Italy => None,
        };

        let table = self.tariff_table(spec)?;
        let bracket = resolve_weight_bracket(request.weight_grams, &self.boundaries)?;

        let query = TariffQuery {
            product: request.product,
            family: spec.family,
            format: &request.format,
            zone,
            bracket,
            weight_grams: request.weight_grams,
        };
        let base_cents = table.base_price(&query, self.policy)?;

        let mut breakdown = PriceBreakdown::with_base(base_cents);
        for (option, cents) in self.options.surcharges(request.product, &request.options)? {
            breakdown.record(option, cents);
        }

        let total_cents = breakdown.total_cents().ok_or_else(|| QuoteError::TariffNotFound {
            product: request.product,
            format: request.format.clone(),
            weight_grams: request.weight_grams,
            zone,
            reason: "total exceeds the representable amount".to_string(),
        })?;

        Ok(Quote {
            total_cents,
            currency: Currency::Eur,
            breakdown,
            product_code: product_code(spec, zone, &request.format),
            weight_bracket: bracket,
            zone,
            notes: table.notes.clone(),
        })
    }

    fn validate(&self, request: &QuoteRequest) -> QuoteResult<&'static ProductSpec> {
        request.validate().map_err(|errors| {
            let fields: BTreeMap<String, Value> = errors
                .field_errors()
                .keys()
                .map(|field| offending_field(request, field))
                .collect();
            let names: Vec<&str> = fields.keys().map(String::as_str).collect();
            QuoteError::InvalidInput {
                message: format!("request validation failed for {}", names.join(", ")),
                fields,
            }
        })?;

        let spec = product_spec(request.product);
        if !spec.allows(&request.format) {
            return Err(QuoteError::FormatNotAllowed {
                product: request.product,
                format: request.format.clone(),
                allowed: spec.formats,
            });
        }

        match &request.destination {
            Destination::Intl { country_iso2 } if country_iso2.trim().is_empty() => {
                return Err(QuoteError::invalid_input(
                    "countryIso2 is required for INTL destinations",
                    "destination.countryIso2",
                    json!(country_iso2),
                ));
            }
            destination if destination.is_international() != spec.family.is_international() => {
                return Err(QuoteError::invalid_input(
                    format!(
                        "product {} cannot ship to a {} destination",
                        request.product,
                        destination.type_name()
                    ),
                    "destination",
                    json!(destination),
                ));
            }
            _ => {}
        }

        if let Some(homologation) = request.homologation {
            debug!(homologation, "Homologation flag does not affect pricing");
        }

        Ok(spec)
    }

    fn tariff_table(&self, spec: &ProductSpec) -> QuoteResult<Arc<TariffTable>> {
        self.load_tariff(spec.tariff_id)
            .map_err(|err| QuoteError::TariffTableUnavailable {
                product: spec.product,
                table: spec.tariff_id,
                reason: err.to_string(),
            })
    }

    fn load_tariff(&self, id: TariffId) -> Result<Arc<TariffTable>, TableLoadError> {
        self.tariffs.get_or_load(id, || {
            let result = self.source.load_tariff(id);
            match &result {
                Ok(_) => info!(table = %id, "Loaded tariff table"),
                Err(err) => warn!(table = %id, error = %err, "Failed to load tariff table"),
            }
            QuoteMetrics::record_tariff_load(id.as_str(), result.is_ok());
            result
        })
    }

    /// Load every catalog table that is not cached yet.
    ///
    /// Returns the tables that failed; an empty list means the service can
    /// price every product.
    pub fn warm_up(&self) -> Vec<(TariffId, TableLoadError)> {
        let failures: Vec<_> = CATALOG
            .iter()
            .filter_map(|spec| {
                self.load_tariff(spec.tariff_id)
                    .err()
                    .map(|err| (spec.tariff_id, err))
            })
            .collect();
        QuoteMetrics::set_tariff_tables_loaded(self.tariffs.loaded_count());
        failures
    }
}

/// Wire path and value of a field rejected by `QuoteRequest::validate`
fn offending_field(request: &QuoteRequest, field: &str) -> (String, Value) {
    match field {
        "weight_grams" => ("weightGrams".to_string(), json!(request.weight_grams)),
        "format" => ("format".to_string(), json!(request.format)),
        other => (other.to_string(), Value::Null),
    }
}

/// `product/zone/format`, or `product/format` without a zone
fn product_code(spec: &ProductSpec, zone: Option<Zone>, format: &str) -> String {
    match zone {
        Some(zone) => format!("{}/{}/{}", spec.product, zone, format),
        None => format!("{}/{}", spec.product, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteErrorCode;
    use crate::models::{ProductCode, QuoteOptions};
    use crate::options::ServiceOption;
    use crate::source::MockRateTableSource;
    use serde_json::json;

    fn zones() -> ZoneMap {
        [("FR", Zone::Zone1), ("US", Zone::Zone2), ("AU", Zone::Zone3)]
            .into_iter()
            .collect()
    }

    fn options() -> OptionsConfig {
        serde_json::from_value(json!({
            "ar": {"cents": 95, "supportedProducts": ["RACCOMANDATA", "RACCOMANDATA_INTERNAZIONALE"]},
            "pdd": {"cents": 40, "supportedProducts": ["RACCOMANDATA"]}
        }))
        .unwrap()
    }

    fn domestic_table() -> TariffTable {
        serde_json::from_value(json!({
            "notes": "domestic notes",
            "tariffs": {
                "standard": {"20": 550, "50": 650},
                "non-standard": {"20": 640, "50": 740}
            }
        }))
        .unwrap()
    }

    fn intl_table() -> TariffTable {
        serde_json::from_value(json!({
            "notes": "intl notes",
            "tariffs": {
                "ZONE_1": {"standard": {"100": 1370}},
                "ZONE_2": {"standard": {"100": 1520}}
            }
        }))
        .unwrap()
    }

    fn mock_source() -> MockRateTableSource {
        let mut source = MockRateTableSource::new();
        source.expect_load_tariff().returning(|id| match id.as_str() {
            "raccomandata" => Ok(domestic_table()),
            "raccomandata_internazionale" => Ok(intl_table()),
            other => Err(TableLoadError::UnknownTable(other.to_string())),
        });
        source
    }

    fn service(source: MockRateTableSource) -> QuoteService<MockRateTableSource> {
        QuoteService::new(source, zones(), options())
    }

    fn domestic(weight_grams: i64, format: &str) -> QuoteRequest {
        QuoteRequest::new(ProductCode::Raccomandata, Destination::Italy, weight_grams, format)
    }

    fn intl(country: &str, weight_grams: i64) -> QuoteRequest {
        QuoteRequest::new(
            ProductCode::RaccomandataInternazionale,
            Destination::Intl {
                country_iso2: country.to_string(),
            },
            weight_grams,
            "standard",
        )
    }

    #[test]
    fn test_domestic_quote_has_no_zone() {
        let quote = service(mock_source()).quote(&domestic(20, "standard")).unwrap();

        assert_eq!(quote.total_cents, 550);
        assert_eq!(quote.breakdown, PriceBreakdown::with_base(550));
        assert_eq!(quote.product_code, "RACCOMANDATA/standard");
        assert_eq!(quote.weight_bracket.max, 20);
        assert_eq!(quote.zone, None);
        assert_eq!(quote.notes, "domestic notes");
    }

    #[test]
    fn test_international_quote_includes_zone_segment() {
        let quote = service(mock_source()).quote(&intl("us", 80)).unwrap();

        assert_eq!(quote.zone, Some(Zone::Zone2));
        assert_eq!(quote.product_code, "RACCOMANDATA_INTERNAZIONALE/ZONE_2/standard");
        assert_eq!(quote.total_cents, 1520);
    }

    #[test]
    fn test_options_are_added_to_total_and_breakdown() {
        let request = domestic(40, "non-standard").with_options(QuoteOptions { ar: true, pdd: true });
        let quote = service(mock_source()).quote(&request).unwrap();

        assert_eq!(quote.breakdown.base_cents, 740);
        assert_eq!(quote.breakdown.ar_cents, Some(95));
        assert_eq!(quote.breakdown.pdd_cents, Some(40));
        assert_eq!(quote.total_cents, 875);
    }

    #[test]
    fn test_unsupported_option_fails_whole_quote() {
        let request = intl("FR", 100).with_options(QuoteOptions { ar: true, pdd: true });
        let err = service(mock_source()).quote(&request).unwrap_err();

        assert_eq!(err.code(), QuoteErrorCode::OptionNotSupported);
        assert!(matches!(
            err,
            QuoteError::OptionNotSupported {
                option: ServiceOption::Pdd,
                ..
            }
        ));
    }

    #[test]
    fn test_non_positive_weight_is_invalid_input() {
        let svc = service(MockRateTableSource::new());
        for weight in [0, -5] {
            let err = svc.quote(&domestic(weight, "standard")).unwrap_err();
            assert_eq!(err.code(), QuoteErrorCode::InvalidInput);
            let ctx = err.context().unwrap();
            assert_eq!(ctx["fields"], json!(["weightGrams"]));
            assert_eq!(ctx["weightGrams"], json!(weight));
            assert!(err.to_string().contains("weightGrams"));
        }
    }

    #[test]
    fn test_empty_format_reports_wire_field() {
        let err = service(MockRateTableSource::new())
            .quote(&domestic(0, ""))
            .unwrap_err();
        let ctx = err.context().unwrap();
        assert_eq!(ctx["fields"], json!(["format", "weightGrams"]));
        assert_eq!(ctx["format"], json!(""));
    }

    #[test]
    fn test_validation_precedes_table_loading() {
        // no load_tariff expectation: any call would panic
        let svc = service(MockRateTableSource::new());
        let err = svc.quote(&domestic(20, "letter")).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::FormatNotAllowed);
    }

    #[test]
    fn test_destination_must_match_product_family() {
        let svc = service(MockRateTableSource::new());
        let mut request = domestic(20, "standard");
        request.destination = Destination::Intl {
            country_iso2: "FR".to_string(),
        };
        let err = svc.quote(&request).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::InvalidInput);

        let mut request = intl("FR", 20);
        request.destination = Destination::Italy;
        assert_eq!(svc.quote(&request).unwrap_err().code(), QuoteErrorCode::InvalidInput);
    }

    #[test]
    fn test_blank_country_is_invalid_input() {
        let err = service(MockRateTableSource::new())
            .quote(&intl("  ", 20))
            .unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::InvalidInput);
        assert_eq!(err.context().unwrap()["destination.countryIso2"], json!("  "));
    }

    #[test]
    fn test_unmapped_country_is_zone_not_found() {
        let err = service(MockRateTableSource::new())
            .quote(&intl("XX", 20))
            .unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::ZoneNotFound);
    }

    #[test]
    fn test_zone_is_resolved_before_weight() {
        let err = service(MockRateTableSource::new())
            .quote(&intl("XX", 5000))
            .unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::ZoneNotFound);
    }

    #[test]
    fn test_overweight_is_out_of_range() {
        let err = service(mock_source()).quote(&domestic(2001, "standard")).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::WeightOutOfRange);
    }

    #[test]
    fn test_missing_tariff_row_is_tariff_not_found() {
        let err = service(mock_source()).quote(&domestic(300, "standard")).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::TariffNotFound);
        assert_eq!(err.context().unwrap()["weightGrams"], json!(300));
    }

    #[test]
    fn test_total_overflow_is_tariff_not_found() {
        let mut source = MockRateTableSource::new();
        source.expect_load_tariff().returning(|_| {
            Ok(serde_json::from_value(json!({
                "notes": "n",
                "tariffs": {"standard": {"20": i64::MAX}}
            }))
            .unwrap())
        });
        let request = domestic(20, "standard").with_options(QuoteOptions { ar: true, pdd: false });

        let err = service(source).quote(&request).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::TariffNotFound);
        assert!(err.context().unwrap()["reason"].as_str().unwrap().contains("total"));
    }

    #[test]
    fn test_strict_sub_format_is_checked_after_weight_range() {
        let mut source = MockRateTableSource::new();
        source.expect_load_tariff().returning(|_| {
            Ok(serde_json::from_value(json!({
                "notes": "n",
                "tariffs": {"standard": {"small": {"20": 110}}}
            }))
            .unwrap())
        });
        let svc = service(source).with_sub_format_policy(SubFormatPolicy::Strict);
        let request = |weight| {
            QuoteRequest::new(ProductCode::Posta1, Destination::Italy, weight, "standard")
        };

        assert_eq!(
            svc.quote(&request(2001)).unwrap_err().code(),
            QuoteErrorCode::WeightOutOfRange
        );
        assert_eq!(
            svc.quote(&request(20)).unwrap_err().code(),
            QuoteErrorCode::InvalidInput
        );
    }

    #[test]
    fn test_table_is_loaded_once() {
        let mut source = MockRateTableSource::new();
        source
            .expect_load_tariff()
            .times(1)
            .returning(|_| Ok(domestic_table()));
        let svc = service(source);

        for _ in 0..3 {
            svc.quote(&domestic(20, "standard")).unwrap();
        }
    }

    #[test]
    fn test_failed_load_is_retried_on_next_call() {
        let mut source = MockRateTableSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_load_tariff()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Err(TableLoadError::UnknownTable(id.to_string())));
        source
            .expect_load_tariff()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(domestic_table()));
        let svc = service(source);

        let err = svc.quote(&domestic(20, "standard")).unwrap_err();
        assert_eq!(err.code(), QuoteErrorCode::TariffNotFound);
        assert!(matches!(err, QuoteError::TariffTableUnavailable { .. }));

        let quote = svc.quote(&domestic(20, "standard")).unwrap();
        assert_eq!(quote.total_cents, 550);
    }

    #[test]
    fn test_from_source_loads_zones_and_options() {
        let mut source = MockRateTableSource::new();
        source.expect_load_zone_map().times(1).returning(|| Ok(zones()));
        source.expect_load_options().times(1).returning(|| Ok(options()));
        source
            .expect_describe()
            .returning(|| "mock".to_string());

        let svc = QuoteService::from_source(source).unwrap();
        assert_eq!(svc.zones().len(), 3);
        assert_eq!(svc.options().ar.cents, Some(95));
    }

    #[test]
    fn test_from_source_propagates_load_errors() {
        let mut source = MockRateTableSource::new();
        source
            .expect_load_zone_map()
            .returning(|| Err(TableLoadError::UnknownTable("zones".to_string())));

        assert!(QuoteService::from_source(source).is_err());
    }

    #[test]
    fn test_warm_up_reports_failing_tables() {
        let svc = service(mock_source());
        let failures = svc.warm_up();

        let failed: Vec<_> = failures.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(
            failed,
            vec!["posta1", "posta4", "raccomandata1", "posta_internazionale"]
        );
    }

    #[test]
    fn test_custom_boundaries() {
        let svc = service(mock_source()).with_weight_boundaries(vec![20, 50]);
        let err = svc.quote(&domestic(51, "standard")).unwrap_err();
        assert_eq!(
            err.context().unwrap()["maxWeightGrams"],
            json!(50)
        );
    }

    #[test]
    fn test_identical_requests_give_identical_output() {
        let svc = service(mock_source());
        let request = intl("FR", 100).with_options(QuoteOptions { ar: true, pdd: false });

        let first = serde_json::to_vec(&svc.quote(&request).unwrap()).unwrap();
        let second = serde_json::to_vec(&svc.quote(&request).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
