//! Metrics definitions for the Document Gateway.
//!
//! Naming follows Prometheus conventions: `dg_` prefix, `_total` suffix for
//! counters. Label values are bounded by code (`method`: 2 values,
//! `outcome`: 2 values, `document`: 2 values) to keep cardinality flat.

use metrics::counter;

/// Record an authentication attempt.
///
/// Metric: `dg_auth_attempts_total`
/// Labels: `method` (bearer | api_key), `outcome` (success | failure)
pub fn record_auth_attempt(method: &str, outcome: &str) {
    counter!("dg_auth_attempts_total",
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an issuer metadata fetch (cache misses only).
///
/// Metric: `dg_metadata_fetches_total`
/// Labels: `document` (discovery | jwks), `outcome` (success | error)
pub fn record_metadata_fetch(document: &str, outcome: &str) {
    counter!("dg_metadata_fetches_total",
        "document" => document.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
