//! Worker span helpers.

use tracing::Span;

use crate::job::WorkerId;

/// Start a span for one worker invocation.
///
/// `work.dispatched` is declared empty and set by [`record_dispatch`] once
/// the worker actually receives an item.
pub fn start_worker_span(id: WorkerId) -> Span {
    tracing::info_span!(
        "worker.run",
        "worker.id" = id.0,
        "work.dispatched" = tracing::field::Empty,
    )
}

/// Mark the span as having received work (or not, if draining won the race).
pub fn record_dispatch(span: &Span, dispatched: bool) {
    span.record("work.dispatched", dispatched);
}
