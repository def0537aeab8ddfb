use crate::{
    error::Error,
    id::QueryId,
    obs::{self, CoordinationEvent},
    query::command::QueryCommand,
    shard::{BackendQueryFactory, QueryRef, ShardId},
};
use std::collections::{BTreeMap, VecDeque};

///
/// QuerySlot
///
/// Per (logical query id, shard) state: an ordered queue of pending
/// commands while unestablished, a live backend handle afterwards.
/// Established is terminal; a slot never reverts.
///

pub enum QuerySlot {
    Pending(VecDeque<QueryCommand>),
    Established(QueryRef),
}

impl QuerySlot {
    #[must_use]
    pub const fn new() -> Self {
        Self::Pending(VecDeque::new())
    }

    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self, Self::Established(_))
    }

    #[must_use]
    pub fn established(&self) -> Option<QueryRef> {
        match self {
            Self::Established(query) => Some(QueryRef::clone(query)),
            Self::Pending(_) => None,
        }
    }

    /// Append a command to the pending queue. Commands never reach the
    /// queue of an established slot; the two-mode dispatch applies them
    /// directly instead.
    pub fn enqueue(&mut self, command: QueryCommand) {
        match self {
            Self::Pending(queue) => queue.push_back(command),
            Self::Established(_) => {
                debug_assert!(false, "command enqueued on an established slot");
            }
        }
    }

    /// Transition to established: replay every queued command against
    /// `query` in arrival order, then publish the handle. Returns the
    /// number of commands replayed.
    ///
    /// Replay happens before the handle is stored, so no caller observes
    /// a partially-replayed handle. Queued commands are consumed exactly
    /// once: on a replay failure the queue is not restored and the handle
    /// is not installed.
    pub fn establish_with(&mut self, query: QueryRef) -> Result<usize, Error> {
        let commands = match self {
            Self::Established(_) => return Ok(0),
            Self::Pending(queue) => std::mem::take(queue),
        };

        let replayed = commands.len();
        {
            let mut handle = query.borrow_mut();
            for command in commands {
                command.apply(&mut *handle)?;
            }
        }

        *self = Self::Established(query);

        Ok(replayed)
    }
}

impl Default for QuerySlot {
    fn default() -> Self {
        Self::new()
    }
}

///
/// QuerySlots
///
/// Per-identifier slot registry a `Shard` implementation owns and
/// delegates to. The registry implements the lazy-establishment protocol;
/// the shard owns the state.
///

#[derive(Default)]
pub struct QuerySlots {
    slots: BTreeMap<QueryId, QuerySlot>,
}

impl QuerySlots {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn established(&self, id: QueryId) -> Option<QueryRef> {
        self.slots.get(&id).and_then(QuerySlot::established)
    }

    pub fn enqueue(&mut self, id: QueryId, command: QueryCommand) {
        self.slots.entry(id).or_default().enqueue(command);
    }

    /// Get-or-establish: returns the already-established handle, or
    /// creates one via `factory` and replays the pending queue.
    pub fn establish(
        &mut self,
        id: QueryId,
        shard: ShardId,
        factory: &dyn BackendQueryFactory,
    ) -> Result<QueryRef, Error> {
        let slot = self.slots.entry(id).or_default();
        if let Some(query) = slot.established() {
            return Ok(query);
        }

        let query = factory.create(shard)?;
        let replayed = slot.establish_with(QueryRef::clone(&query))?;
        obs::emit(CoordinationEvent::SlotEstablished { replayed });

        Ok(query)
    }

    /// Number of commands pending for `id`. Zero once established.
    #[must_use]
    pub fn pending_len(&self, id: QueryId) -> usize {
        match self.slots.get(&id) {
            Some(QuerySlot::Pending(queue)) => queue.len(),
            _ => 0,
        }
    }
}

///
/// TESTS
///
