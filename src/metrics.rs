use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::time::Instant;

lazy_static! {
    // Request metrics
    pub static ref RENDER_REQUESTS: IntCounter = register_int_counter!(
        "graphite_render_requests_total",
        "Total number of render requests sent"
    ).unwrap();

    pub static ref RENDER_REQUEST_DURATION: Histogram = register_histogram!(
        "graphite_render_request_duration_seconds",
        "Render round trip time in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    pub static ref RENDER_FAILURES: IntCounterVec = register_int_counter_vec!(
        "graphite_render_failures_total",
        "Total number of failed render requests by error kind",
        &["kind"]
    ).unwrap();

    // Decode metrics
    pub static ref SERIES_DECODED: IntCounter = register_int_counter!(
        "graphite_series_decoded_total",
        "Total number of series decoded from render bodies"
    ).unwrap();

    // Evaluation metrics
    pub static ref EVALUATIONS: IntCounterVec = register_int_counter_vec!(
        "graphite_evaluations_total",
        "Per-series evaluation outcomes",
        &["outcome"]
    ).unwrap();
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn new() -> Self {
        RENDER_REQUESTS.inc();
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        RENDER_REQUEST_DURATION.observe(duration);
    }
}

pub fn record_failure(kind: &str) {
    RENDER_FAILURES.with_label_values(&[kind]).inc();
}

pub fn record_series_decoded(count: usize) {
    SERIES_DECODED.inc_by(count as u64);
}

pub fn record_evaluation(success: bool, is_absent: bool) {
    let outcome = match (success, is_absent) {
        (_, true) => "absent",
        (true, false) => "success",
        (false, false) => "failure",
    };
    EVALUATIONS.with_label_values(&[outcome]).inc();
}
