// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    RESPONSES_TOTAL,
    BUSY_REJECTIONS,
    MODEL_LOADS,
    GENERATION_DURATION,
    GATEWAY_STATE,
    CACHE_OPERATIONS,
};

/// Helper to record which layer produced a reply
pub fn record_response(source: &str) {
    RESPONSES_TOTAL.with_label_values(&[source]).inc();
}

pub fn record_busy_rejection() {
    BUSY_REJECTIONS.with_label_values(&["in_flight"]).inc();
}

/// Helper to record model load outcomes
pub fn record_model_load(model: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    MODEL_LOADS.with_label_values(&[model, status]).inc();
}

/// Helper to record a model invocation
pub fn record_generation(kind: &str, outcome: &str, duration_secs: f64) {
    GENERATION_DURATION
        .with_label_values(&[kind, outcome])
        .observe(duration_secs);
}

/// Mark `current` as the only active gateway state
pub fn update_gateway_state(current: &str, all_states: &[&str]) {
    for state in all_states {
        let value = if *state == current { 1.0 } else { 0.0 };
        GATEWAY_STATE.with_label_values(&[state]).set(value);
    }
}

/// Helper to record response cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_write() {
    CACHE_OPERATIONS.with_label_values(&["write"]).inc();
}

pub fn record_cache_expired() {
    CACHE_OPERATIONS.with_label_values(&["expire"]).inc();
}

pub fn record_cache_write_error() {
    CACHE_OPERATIONS.with_label_values(&["write_error"]).inc();
}
