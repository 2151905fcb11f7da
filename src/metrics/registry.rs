// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, GaugeVec, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_gauge_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // RESPONSE METRICS
    // ============================================================================

    /// Replies handed back to the UI
    pub static ref RESPONSES_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("picksy_responses_total", "Total replies produced"),
        &["source"], // source: cache, model, keyword, reset
        REGISTRY
    ).unwrap();

    /// Calls rejected because a reply was already in flight
    pub static ref BUSY_REJECTIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("picksy_busy_rejections_total", "Replies rejected while busy"),
        &["reason"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // MODEL METRICS
    // ============================================================================

    /// Model load attempts
    pub static ref MODEL_LOADS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("picksy_model_loads_total", "Total model load attempts"),
        &["model", "status"], // status: success, failure
        REGISTRY
    ).unwrap();

    /// Model invocation duration
    pub static ref GENERATION_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("picksy_generation_duration_seconds", "Model invocation duration")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["kind", "outcome"], // kind: generator, classifier; outcome: ok, error, timeout, empty
        REGISTRY
    ).unwrap();

    /// Gateway state (1 for the current state, 0 otherwise)
    pub static ref GATEWAY_STATE: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("picksy_gateway_state", "Current model gateway state"),
        &["state"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("picksy_cache_operations_total", "Total cache operations"),
        &["operation"], // operation: hit, miss, write, expire, write_error
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
