use serde::{Deserialize, Serialize};
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

///
/// EventState
/// Ephemeral, in-memory counters for coordination operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Handle lifecycle
    pub queries_created: u64,
    pub subqueries_created: u64,

    // Two-mode dispatch
    pub commands_applied: u64,
    pub commands_queued: u64,
    pub commands_replayed: u64,
    pub slots_established: u64,

    // Scatter-gather execution
    pub list_calls: u64,
    pub unique_calls: u64,
    pub rows_merged: u64,
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

pub(crate) fn report() -> EventState {
    STATE.with(|state| state.borrow().clone())
}

pub(crate) fn reset() {
    STATE.with(|state| *state.borrow_mut() = EventState::default());
}
