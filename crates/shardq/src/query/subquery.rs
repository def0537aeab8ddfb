use crate::{
    error::Error,
    obs::{self, CoordinationEvent},
    query::{
        command::QueryCommand,
        executor,
        expr::{Projection, SortOrder, SubQuerySpec},
        federated::QueryCore,
        ops::QueryOps,
        slot::QuerySlot,
    },
    row::Row,
    shard::{QueryRef, ShardId},
};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

/// Per-shard sub-query slots, keyed by shard. Same state machine as the
/// shard-owned parent slots, but owned by the federated sub-query handle.
type SubSlots = BTreeMap<ShardId, QuerySlot>;

///
/// SubQueryRegistrar
///
/// Captured inside a queued `CreateSubQuery` command. At replay time it
/// installs the freshly created per-shard backend sub-query into the
/// federated sub-query handle that was returned to the caller at
/// creation time, then replays that slot's own pending queue.
///

#[derive(Clone)]
pub struct SubQueryRegistrar {
    slots: Rc<RefCell<SubSlots>>,
    shard: ShardId,
}

impl SubQueryRegistrar {
    pub(crate) fn install(&self, query: QueryRef) -> Result<(), Error> {
        let mut slots = self.slots.borrow_mut();
        slots.entry(self.shard).or_default().establish_with(query)?;

        Ok(())
    }
}

///
/// FederatedSubQuery
///
/// Pass-through wrapper giving a federated sub-query the same capability
/// set as its parent handle. Per-shard backing handles may not exist yet
/// when this is returned: shards with an established parent handle get
/// their sub-query immediately, the rest are deferred behind a queued
/// `CreateSubQuery` command and installed at parent establishment.
///
/// Execution and global settings (limits, read-only) delegate to the
/// parent; the whole logical query always runs as one unit.
///

pub struct FederatedSubQuery {
    core: Rc<QueryCore>,
    slots: Rc<RefCell<SubSlots>>,
}

/// Build a federated sub-query on a parent handle's core.
pub(crate) fn create(
    core: Rc<QueryCore>,
    spec: &SubQuerySpec,
) -> Result<FederatedSubQuery, Error> {
    let slots: Rc<RefCell<SubSlots>> = Rc::new(RefCell::new(SubSlots::new()));

    let mut established = 0_usize;
    let mut deferred = 0_usize;
    for shard in core.shards() {
        match shard.established_query(core.id()) {
            Some(parent) => {
                let sub = parent.borrow_mut().create_subquery(spec)?;
                slots
                    .borrow_mut()
                    .entry(shard.shard_id())
                    .or_default()
                    .establish_with(sub)?;
                established += 1;
            }
            None => {
                let registrar = SubQueryRegistrar {
                    slots: Rc::clone(&slots),
                    shard: shard.shard_id(),
                };
                shard.enqueue_command(
                    core.id(),
                    QueryCommand::CreateSubQuery {
                        spec: spec.clone(),
                        registrar,
                    },
                );
                deferred += 1;
            }
        }
    }

    obs::emit(CoordinationEvent::SubQueryCreated {
        established,
        deferred,
    });

    Ok(FederatedSubQuery { core, slots })
}

impl FederatedSubQuery {
    /// Two-mode dispatch against this sub-query's own slots.
    fn dispatch(&self, command: &QueryCommand) -> Result<(), Error> {
        for shard in self.core.shards() {
            let shard_id = shard.shard_id();
            let query = self
                .slots
                .borrow()
                .get(&shard_id)
                .and_then(QuerySlot::established);

            match query {
                Some(query) => {
                    command.apply(&mut *query.borrow_mut())?;
                    obs::emit(CoordinationEvent::CommandApplied {
                        label: command.label(),
                    });
                }
                None => {
                    self.slots
                        .borrow_mut()
                        .entry(shard_id)
                        .or_default()
                        .enqueue(command.clone());
                    obs::emit(CoordinationEvent::CommandQueued {
                        label: command.label(),
                    });
                }
            }
        }

        Ok(())
    }

    fn some_established(&self) -> Option<QueryRef> {
        let slots = self.slots.borrow();

        self.core
            .shards()
            .iter()
            .find_map(|shard| slots.get(&shard.shard_id()).and_then(QuerySlot::established))
    }

    /// Any backing sub-handle, forcing parent establishment if none
    /// exists yet (which replays the queued `CreateSubQuery` and installs
    /// the corresponding slot here).
    fn get_or_establish_some(&self) -> Result<QueryRef, Error> {
        if let Some(query) = self.some_established() {
            return Ok(query);
        }

        self.core.get_or_establish_some()?;

        self.some_established().ok_or_else(|| {
            Error::invariant("sub-query handle missing after parent establishment")
        })
    }

    /// True when this shard's backing sub-handle exists.
    #[must_use]
    pub fn is_established_on(&self, shard: ShardId) -> bool {
        self.slots
            .borrow()
            .get(&shard)
            .is_some_and(QuerySlot::is_established)
    }
}

impl QueryOps for FederatedSubQuery {
    fn mutate(&self, command: QueryCommand) -> Result<(), Error> {
        self.dispatch(&command)
    }

    /// Sub-query ordering must reach the per-shard sub-handles: the
    /// post-merge sort only sees top-level merged rows.
    fn add_order(&self, order: SortOrder) -> Result<&Self, Error> {
        self.dispatch(&QueryCommand::AddOrder(order))?;
        Ok(self)
    }

    fn set_projection(&self, projection: Projection) -> Result<&Self, Error> {
        self.dispatch(&QueryCommand::SetProjection(projection))?;
        Ok(self)
    }

    fn create_subquery(&self, spec: SubQuerySpec) -> Result<FederatedSubQuery, Error> {
        let child: Rc<RefCell<SubSlots>> = Rc::new(RefCell::new(SubSlots::new()));

        let mut established = 0_usize;
        let mut deferred = 0_usize;
        for shard in self.core.shards() {
            let shard_id = shard.shard_id();
            let query = self
                .slots
                .borrow()
                .get(&shard_id)
                .and_then(QuerySlot::established);

            match query {
                Some(query) => {
                    let sub = query.borrow_mut().create_subquery(&spec)?;
                    child
                        .borrow_mut()
                        .entry(shard_id)
                        .or_default()
                        .establish_with(sub)?;
                    established += 1;
                }
                None => {
                    let registrar = SubQueryRegistrar {
                        slots: Rc::clone(&child),
                        shard: shard_id,
                    };
                    self.slots
                        .borrow_mut()
                        .entry(shard_id)
                        .or_default()
                        .enqueue(QueryCommand::CreateSubQuery {
                            spec: spec.clone(),
                            registrar,
                        });
                    deferred += 1;
                }
            }
        }

        obs::emit(CoordinationEvent::SubQueryCreated {
            established,
            deferred,
        });

        Ok(Self {
            core: Rc::clone(&self.core),
            slots: child,
        })
    }

    fn set_max_results(&self, limit: u32) -> &Self {
        self.core.with_collector_mut(|c| c.set_max_results(limit));
        self
    }

    fn set_first_result(&self, offset: u32) -> &Self {
        self.core.with_collector_mut(|c| c.set_first_result(offset));
        self
    }

    fn set_read_only(&self, read_only: bool) -> &Self {
        self.core.set_read_only(read_only);
        self
    }

    fn is_read_only_initialized(&self) -> bool {
        self.core.is_read_only_initialized()
    }

    fn is_read_only(&self) -> Result<bool, Error> {
        self.core.is_read_only()
    }

    fn alias(&self) -> Result<Option<String>, Error> {
        let query = self.get_or_establish_some()?;
        let alias = query.borrow().alias();

        Ok(alias)
    }

    fn list(&self) -> Result<Vec<Row>, Error> {
        executor::list(&self.core)
    }

    fn unique_result(&self) -> Result<Option<Row>, Error> {
        executor::unique(&self.core)
    }
}
