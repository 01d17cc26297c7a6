//! Quote engine metrics.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Quote metrics recorder
pub struct QuoteMetrics;

impl QuoteMetrics {
    // =========================================================================
    // Quote Metrics
    // =========================================================================

    /// Record a successful quote
    pub fn record_quote(product: &str, total_cents: i64, duration: Duration) {
        counter!("postal_quotes_total", "product" => product.to_string(), "outcome" => "ok")
            .increment(1);
        histogram!("postal_quote_total_cents", "product" => product.to_string())
            .record(total_cents as f64);
        histogram!("postal_quote_duration_seconds", "product" => product.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record a rejected or failed quote
    pub fn record_quote_error(product: &str, code: &str, duration: Duration) {
        counter!("postal_quotes_total", "product" => product.to_string(), "outcome" => "error")
            .increment(1);
        counter!("postal_quote_errors_total", "code" => code.to_string()).increment(1);
        histogram!("postal_quote_duration_seconds", "product" => product.to_string())
            .record(duration.as_secs_f64());
    }

    // =========================================================================
    // Tariff Table Metrics
    // =========================================================================

    /// Record a tariff table load attempt
    pub fn record_tariff_load(table: &str, success: bool) {
        let status = if success { "loaded" } else { "failed" };
        counter!("postal_tariff_loads_total", "table" => table.to_string(), "status" => status)
            .increment(1);
    }

    /// Set the number of tariff tables currently cached
    pub fn set_tariff_tables_loaded(count: usize) {
        gauge!("postal_tariff_tables_loaded").set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        QuoteMetrics::record_quote("POSTA1", 285, Duration::from_millis(1));
        QuoteMetrics::record_quote_error("POSTA1", "INVALID_INPUT", Duration::ZERO);
        QuoteMetrics::record_tariff_load("posta1", false);
        QuoteMetrics::set_tariff_tables_loaded(3);
    }
}
