//! Metric instrument factories for racket.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider (no OTLP endpoint) every instrument is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for racket instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("racket")
}

/// Counter: worker slots granted by an admission loop.
pub fn workers_admitted() -> Counter<u64> {
    meter()
        .u64_counter("racket.workers.admitted")
        .with_description("Number of worker slots granted")
        .build()
}

/// Counter: work items actually handed to a worker.
pub fn work_dispatched() -> Counter<u64> {
    meter()
        .u64_counter("racket.work.dispatched")
        .with_description("Number of work items dispatched to workers")
        .build()
}

/// Histogram: wall time of one worker invocation in milliseconds.
pub fn work_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("racket.work.duration_ms")
        .with_description("Worker invocation duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: progress envelopes routed by a sink.
/// Labels: `kind` (the kind name, empty for unrecognized kinds).
pub fn progress_routed() -> Counter<u64> {
    meter()
        .u64_counter("racket.progress.routed")
        .with_description("Number of progress envelopes routed by a sink")
        .build()
}
