//! Prometheus metrics for matching-service.
//!
//! Exposes swipe/match/scoring collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Swipes recorded, segmented by action (like/pass).
    pub static ref SWIPES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "matching_swipes_total",
        "Swipes recorded segmented by action",
        &["action"]
    )
    .expect("failed to register matching_swipes_total");

    /// Pairs that transitioned to matched.
    pub static ref NEW_MATCHES_TOTAL: IntCounter = register_int_counter!(
        "matching_new_matches_total",
        "Pairs that became a mutual match"
    )
    .expect("failed to register matching_new_matches_total");

    /// Compatibility scores served, segmented by source (cache/inference/heuristic).
    pub static ref COMPATIBILITY_SCORES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "matching_compatibility_scores_total",
        "Compatibility scores served segmented by source",
        &["source"]
    )
    .expect("failed to register matching_compatibility_scores_total");

    /// Stale match writes that had to be re-read and re-applied.
    pub static ref WRITE_CONFLICTS_TOTAL: IntCounter = register_int_counter!(
        "matching_write_conflicts_total",
        "Match writes rejected because of a concurrent update"
    )
    .expect("failed to register matching_write_conflicts_total");

    /// End-to-end suggestion computation time.
    pub static ref SUGGESTION_DURATION_SECONDS: Histogram = register_histogram!(
        "matching_suggestion_duration_seconds",
        "Time spent building a suggestion list"
    )
    .expect("failed to register matching_suggestion_duration_seconds");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
