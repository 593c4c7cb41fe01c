//! Integration tests for telemetry initialization and span helpers.

use racket::WorkerId;

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process; a second attempt
    // returns Err, which is acceptable here.
    let config = racket::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "racket-test".to_string(),
        log_level: "debug".to_string(),
    };
    let _guard = racket::telemetry::init_telemetry(config);
}

#[test]
fn worker_span_creates_and_records_dispatch() {
    let span = racket::telemetry::worker::start_worker_span(WorkerId(1));
    racket::telemetry::worker::record_dispatch(&span, true);
}

#[test]
fn metric_instruments_are_usable_without_a_provider() {
    racket::telemetry::metrics::workers_admitted().add(1, &[]);
    racket::telemetry::metrics::work_duration_ms().record(1.5, &[]);
}
