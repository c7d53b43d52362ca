use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Session registry
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_total",
        "Total number of game sessions by lifecycle event",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of sessions still accepting claims"
    )
    .unwrap();

    pub static ref CLAIMS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "claims_received_total",
        "Total number of claims posted to the session API",
        &["valid"]
    )
    .unwrap();

    // Game controller
    pub static ref CLAIM_DELIVERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "claim_deliveries_total",
        "Claims pushed to the backend after a submit",
        &["outcome"]
    )
    .unwrap();

    pub static ref SUBMIT_TRIGGERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "submit_triggers_total",
        "Submits by what started them",
        &["trigger"]
    )
    .unwrap();

    pub static ref SESSION_VERDICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "session_verdicts_total",
        "Session verdicts",
        &["verdict"]
    )
    .unwrap();

    pub static ref SSE_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sse_connections_active",
        "Number of active SSE connections"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
