//! Metrics sink boundary.
//!
//! Coordination logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through CoordinationEvent and MetricsSink.
//!
//! This module is the only allowed bridge between coordination logic
//! and the process-local metrics state.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    List,
    Unique,
}

///
/// CoordinationEvent
///

#[derive(Clone, Copy, Debug)]
pub enum CoordinationEvent {
    QueryCreated {
        shard_count: usize,
    },
    SubQueryCreated {
        established: usize,
        deferred: usize,
    },
    CommandApplied {
        label: &'static str,
    },
    CommandQueued {
        label: &'static str,
    },
    SlotEstablished {
        replayed: usize,
    },
    ExecStart {
        kind: ExecKind,
    },
    ExecFinish {
        kind: ExecKind,
        rows: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: CoordinationEvent);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global counter state.
/// Acts as the concrete sink when no scoped override is installed.

struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: CoordinationEvent) {
        metrics::with_state_mut(|m| match event {
            CoordinationEvent::QueryCreated { .. } => {
                m.ops.queries_created = m.ops.queries_created.saturating_add(1);
            }
            CoordinationEvent::SubQueryCreated { .. } => {
                m.ops.subqueries_created = m.ops.subqueries_created.saturating_add(1);
            }
            CoordinationEvent::CommandApplied { .. } => {
                m.ops.commands_applied = m.ops.commands_applied.saturating_add(1);
            }
            CoordinationEvent::CommandQueued { .. } => {
                m.ops.commands_queued = m.ops.commands_queued.saturating_add(1);
            }
            CoordinationEvent::SlotEstablished { replayed } => {
                m.ops.slots_established = m.ops.slots_established.saturating_add(1);
                let replayed = u64::try_from(replayed).unwrap_or(u64::MAX);
                m.ops.commands_replayed = m.ops.commands_replayed.saturating_add(replayed);
            }
            CoordinationEvent::ExecStart { kind } => match kind {
                ExecKind::List => m.ops.list_calls = m.ops.list_calls.saturating_add(1),
                ExecKind::Unique => m.ops.unique_calls = m.ops.unique_calls.saturating_add(1),
            },
            CoordinationEvent::ExecFinish { rows, .. } => {
                m.ops.rows_merged = m.ops.rows_merged.saturating_add(rows);
            }
        });
    }
}

/// Record one event through the active sink.
pub(crate) fn emit(event: CoordinationEvent) {
    let handled = SINK_OVERRIDE.with(|cell| {
        if let Some(sink) = cell.borrow().as_ref() {
            sink.record(event);
            return true;
        }

        false
    });

    if !handled {
        GlobalMetricsSink.record(event);
    }
}

/// Run `f` with a scoped sink override. Used by tests to observe events
/// without reading global counter state.
pub fn with_sink<R>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> R) -> R {
    SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = Some(sink));
    let result = f();
    SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);

    result
}
