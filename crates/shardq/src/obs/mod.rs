//! Observability: coordination telemetry (counters) and sink abstractions.
//!
//! Core coordination logic does not mutate counter state directly; all
//! instrumentation flows through [`CoordinationEvent`] and [`MetricsSink`].

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventState};
pub use sink::{CoordinationEvent, ExecKind, MetricsSink, with_sink};

pub(crate) use sink::emit;

/// Clone the current process-local counter state.
#[must_use]
pub fn metrics_report() -> EventState {
    metrics::report()
}

/// Reset the process-local counter state.
pub fn metrics_reset() {
    metrics::reset();
}
