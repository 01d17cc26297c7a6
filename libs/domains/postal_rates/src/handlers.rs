//! HTTP handlers for the postal rates domain

use axum::{
    extract::{FromRequest, Json, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::catalog::ProductSpec;
use crate::error::{QuoteError, QuoteErrorBody, QuoteErrorCode, QuoteResult};
use crate::models::{
    Currency, Destination, PriceBreakdown, ProductCode, ProductFamily, Quote, QuoteOptions,
    QuoteRequest, WeightBracket, Zone,
};
use crate::options::{OptionRule, ServiceOption};
use crate::service::QuoteService;
use crate::source::RateTableSource;

pub const TAG: &str = "rates";

/// OpenAPI documentation for the rates API
#[derive(OpenApi)]
#[openapi(
    paths(create_quote, list_products, get_zone, list_options),
    components(schemas(
        QuoteRequest,
        Quote,
        Destination,
        QuoteOptions,
        PriceBreakdown,
        WeightBracket,
        ProductCode,
        ProductFamily,
        Zone,
        Currency,
        ServiceOption,
        QuoteErrorCode,
        QuoteErrorBody,
        ProductInfo,
        ZoneLookup,
        OptionInfo,
    )),
    tags((name = TAG, description = "Postal rate quotes and reference data"))
)]
pub struct ApiDoc;

/// Create the rates router with all HTTP endpoints
pub fn router<S: RateTableSource + 'static>(service: QuoteService<S>) -> Router {
    Router::new()
        .route("/quote", post(create_quote))
        .route("/products", get(list_products))
        .route("/zones/{country}", get(get_zone))
        .route("/options", get(list_options))
        .with_state(Arc::new(service))
}

/// JSON extractor whose rejections are reported as `INVALID_INPUT`.
///
/// Field validation is left to the quote service so every entry point
/// reports it the same way.
pub struct QuoteJson<T>(pub T);

impl<T, S> FromRequest<S> for QuoteJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = QuoteError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| QuoteError::InvalidInput {
                message: rejection.body_text(),
                fields: Default::default(),
            })?;
        Ok(QuoteJson(data))
    }
}

/// Catalog entry with the options the product may request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub product: ProductCode,
    pub family: ProductFamily,
    pub international: bool,
    pub formats: Vec<String>,
    pub options: Vec<ServiceOption>,
}

/// Zone assigned to a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneLookup {
    pub country_iso2: String,
    pub zone: Zone,
}

/// Pricing and availability of an optional service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionInfo {
    pub option: ServiceOption,
    pub description: String,
    /// Absent when the option carries no surcharge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cents: Option<i64>,
    /// Absent when every product may request the option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_products: Option<Vec<ProductCode>>,
}

impl OptionInfo {
    fn new(option: ServiceOption, rule: &OptionRule) -> Self {
        Self {
            option,
            description: option.description().to_string(),
            cents: rule.cents,
            supported_products: rule.supported_products.clone(),
        }
    }
}

fn product_info<S: RateTableSource>(service: &QuoteService<S>, spec: &ProductSpec) -> ProductInfo {
    ProductInfo {
        product: spec.product,
        family: spec.family,
        international: spec.family.is_international(),
        formats: spec.formats.iter().map(|format| format.to_string()).collect(),
        options: service.options().available_for(spec.product),
    }
}

/// Price a shipment.
///
/// Runs on the blocking pool: the first quote for a product may read its
/// tariff table from disk.
#[utoipa::path(
    post,
    path = "/quote",
    tag = TAG,
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = Quote),
        (status = 400, description = "Request cannot be priced", body = QuoteErrorBody),
        (status = 500, description = "Tariff tables cannot price the request", body = QuoteErrorBody)
    )
)]
async fn create_quote<S: RateTableSource + 'static>(
    State(service): State<Arc<QuoteService<S>>>,
    QuoteJson(request): QuoteJson<QuoteRequest>,
) -> Response {
    match tokio::task::spawn_blocking(move || service.quote(&request)).await {
        Ok(Ok(quote)) => Json(quote).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            tracing::error!("Quote task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// List quotable products
#[utoipa::path(
    get,
    path = "/products",
    tag = TAG,
    responses(
        (status = 200, description = "Product catalog", body = Vec<ProductInfo>)
    )
)]
async fn list_products<S: RateTableSource>(
    State(service): State<Arc<QuoteService<S>>>,
) -> Json<Vec<ProductInfo>> {
    let products = service
        .catalog()
        .iter()
        .map(|spec| product_info(&service, spec))
        .collect();
    Json(products)
}

/// Look up the pricing zone of a country
#[utoipa::path(
    get,
    path = "/zones/{country}",
    tag = TAG,
    params(
        ("country" = String, Path, description = "ISO-3166 alpha-2 country code")
    ),
    responses(
        (status = 200, description = "Zone found", body = ZoneLookup),
        (status = 400, description = "Country has no zone", body = QuoteErrorBody)
    )
)]
async fn get_zone<S: RateTableSource>(
    State(service): State<Arc<QuoteService<S>>>,
    Path(country): Path<String>,
) -> QuoteResult<Json<ZoneLookup>> {
    let zone = service.zones().resolve(&country)?;
    Ok(Json(ZoneLookup {
        country_iso2: country.trim().to_ascii_uppercase(),
        zone,
    }))
}

/// List optional services
#[utoipa::path(
    get,
    path = "/options",
    tag = TAG,
    responses(
        (status = 200, description = "Option rules", body = Vec<OptionInfo>)
    )
)]
async fn list_options<S: RateTableSource>(
    State(service): State<Arc<QuoteService<S>>>,
) -> Json<Vec<OptionInfo>> {
    use strum::IntoEnumIterator;

    let options = ServiceOption::iter()
        .map(|option| OptionInfo::new(option, service.options().rule(option)))
        .collect();
    Json(options)
}
