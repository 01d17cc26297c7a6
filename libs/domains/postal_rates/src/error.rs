use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::TariffId;
use crate::models::{ProductCode, Zone};
use crate::options::ServiceOption;

/// Result type for quote operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Wire-level error codes returned to callers of the quote engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteErrorCode {
    /// Malformed request (non-positive weight, missing field)
    InvalidInput,
    /// Format is not legal for the requested product
    FormatNotAllowed,
    /// Weight exceeds the largest configured bracket
    WeightOutOfRange,
    /// Destination country is not mapped to a zone
    ZoneNotFound,
    /// Requested option is not available for the product
    OptionNotSupported,
    /// Configured tables lack a price, or a table failed to load
    TariffNotFound,
}

impl QuoteErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::FormatNotAllowed => "FORMAT_NOT_ALLOWED",
            Self::WeightOutOfRange => "WEIGHT_OUT_OF_RANGE",
            Self::ZoneNotFound => "ZONE_NOT_FOUND",
            Self::OptionNotSupported => "OPTION_NOT_SUPPORTED",
            Self::TariffNotFound => "TARIFF_NOT_FOUND",
        }
    }

    /// Whether the caller can fix the request on their own.
    ///
    /// `TARIFF_NOT_FOUND` is the only operator-side code: the request was
    /// valid but the deployed tables cannot price it.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::TariffNotFound)
    }

    pub fn http_status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl std::fmt::Display for QuoteErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that terminate a quote request
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Request failed structural validation.
    ///
    /// `fields` maps each offending wire field path to the value it held.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        fields: BTreeMap<String, Value>,
    },

    /// Format is not in the product's format list
    #[error("Format '{format}' is not allowed for product {product}")]
    FormatNotAllowed {
        product: ProductCode,
        format: String,
        allowed: &'static [&'static str],
    },

    /// Weight is above the largest bracket boundary
    #[error("Weight {weight_grams} g exceeds the maximum supported weight of {max_weight_grams} g")]
    WeightOutOfRange {
        weight_grams: i64,
        max_weight_grams: u32,
    },

    /// Country code has no zone
    #[error("No pricing zone configured for country '{country_iso2}'")]
    ZoneNotFound { country_iso2: String },

    /// Option is restricted to other products
    #[error("Option '{option}' is not supported for product {product}")]
    OptionNotSupported {
        option: ServiceOption,
        product: ProductCode,
    },

    /// Resolved combination has no price in the tariff table
    #[error("No tariff for {product} format '{format}' at {weight_grams} g: {reason}")]
    TariffNotFound {
        product: ProductCode,
        format: String,
        weight_grams: i64,
        zone: Option<Zone>,
        reason: String,
    },

    /// Tariff table could not be loaded
    #[error("Tariff table '{table}' for {product} is unavailable: {reason}")]
    TariffTableUnavailable {
        product: ProductCode,
        table: TariffId,
        reason: String,
    },
}

/// Serialized error shape: `{code, message, context?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuoteErrorBody {
    pub code: QuoteErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, Value>>,
}

impl QuoteError {
    /// `INVALID_INPUT` for a single offending field
    pub fn invalid_input(message: impl Into<String>, field: &str, value: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            fields: BTreeMap::from([(field.to_string(), value)]),
        }
    }

    pub fn code(&self) -> QuoteErrorCode {
        match self {
            Self::InvalidInput { .. } => QuoteErrorCode::InvalidInput,
            Self::FormatNotAllowed { .. } => QuoteErrorCode::FormatNotAllowed,
            Self::WeightOutOfRange { .. } => QuoteErrorCode::WeightOutOfRange,
            Self::ZoneNotFound { .. } => QuoteErrorCode::ZoneNotFound,
            Self::OptionNotSupported { .. } => QuoteErrorCode::OptionNotSupported,
            Self::TariffNotFound { .. } | Self::TariffTableUnavailable { .. } => {
                QuoteErrorCode::TariffNotFound
            }
        }
    }

    /// Offending values, keyed the same way as the request fields.
    pub fn context(&self) -> Option<BTreeMap<String, Value>> {
        let mut ctx = BTreeMap::new();
        match self {
            Self::InvalidInput { fields, .. } => {
                if fields.is_empty() {
                    return None;
                }
                let names: Vec<&String> = fields.keys().collect();
                ctx.insert("fields".to_string(), json!(names));
                ctx.extend(fields.iter().map(|(field, value)| (field.clone(), value.clone())));
            }
            Self::FormatNotAllowed {
                product,
                format,
                allowed,
            } => {
                ctx.insert("product".to_string(), json!(product));
                ctx.insert("format".to_string(), json!(format));
                ctx.insert("allowedFormats".to_string(), json!(allowed));
            }
            Self::WeightOutOfRange {
                weight_grams,
                max_weight_grams,
            } => {
                ctx.insert("weightGrams".to_string(), json!(weight_grams));
                ctx.insert("maxWeightGrams".to_string(), json!(max_weight_grams));
            }
            Self::ZoneNotFound { country_iso2 } => {
                ctx.insert("countryIso2".to_string(), json!(country_iso2));
            }
            Self::OptionNotSupported { option, product } => {
                ctx.insert("option".to_string(), json!(option));
                ctx.insert("product".to_string(), json!(product));
            }
            Self::TariffNotFound {
                product,
                format,
                weight_grams,
                zone,
                reason,
            } => {
                ctx.insert("product".to_string(), json!(product));
                ctx.insert("format".to_string(), json!(format));
                ctx.insert("weightGrams".to_string(), json!(weight_grams));
                if let Some(zone) = zone {
                    ctx.insert("zone".to_string(), json!(zone));
                }
                ctx.insert("reason".to_string(), json!(reason));
            }
            Self::TariffTableUnavailable {
                product,
                table,
                reason,
            } => {
                ctx.insert("product".to_string(), json!(product));
                ctx.insert("table".to_string(), json!(table.as_str()));
                ctx.insert("reason".to_string(), json!(reason));
            }
        }
        Some(ctx)
    }

    pub fn body(&self) -> QuoteErrorBody {
        QuoteErrorBody {
            code: self.code(),
            message: self.to_string(),
            context: self.context(),
        }
    }
}

impl IntoResponse for QuoteError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code.is_client_error() {
            tracing::debug!(code = %code, "Quote rejected: {}", self);
        } else {
            tracing::error!(code = %code, "Quote failed on operator data: {}", self);
        }

        (code.http_status(), Json(self.body())).into_response()
    }
}
