use crate::{
    error::Error,
    id::QueryId,
    obs::{self, CoordinationEvent},
    query::{
        access::{SequentialAccess, ShardAccessStrategy},
        collector::ExitCollector,
        command::QueryCommand,
        executor,
        expr::{Projection, SortOrder, SubQuerySpec},
        ops::QueryOps,
        subquery::{self, FederatedSubQuery},
    },
    row::Row,
    shard::{BackendQueryFactory, QueryRef, ShardRef},
};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

///
/// QueryCore
///
/// State shared between a federated handle and the sub-query handles it
/// spawns: the logical query identifier, the shard set, the backend
/// query factory, the access strategy, the post-merge collector, and the
/// read-only flag. Cheap to share by reference count; the coordination
/// layer is single-caller.
///

pub(crate) struct QueryCore {
    id: QueryId,
    shards: Vec<ShardRef>,
    factory: Rc<dyn BackendQueryFactory>,
    access: Rc<dyn ShardAccessStrategy>,
    collector: RefCell<ExitCollector>,
    read_only: Cell<Option<bool>>,
}

impl QueryCore {
    pub(crate) const fn id(&self) -> QueryId {
        self.id
    }

    pub(crate) fn shards(&self) -> &[ShardRef] {
        &self.shards
    }

    pub(crate) fn access(&self) -> &dyn ShardAccessStrategy {
        self.access.as_ref()
    }

    /// Two-mode dispatch across every shard: apply directly where a
    /// backend handle is established, queue in arrival order elsewhere.
    pub(crate) fn mutate(&self, command: &QueryCommand) -> Result<(), Error> {
        for shard in &self.shards {
            match shard.established_query(self.id) {
                Some(query) => {
                    command.apply(&mut *query.borrow_mut())?;
                    obs::emit(CoordinationEvent::CommandApplied {
                        label: command.label(),
                    });
                }
                None => {
                    shard.enqueue_command(self.id, command.clone());
                    obs::emit(CoordinationEvent::CommandQueued {
                        label: command.label(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Any established backend handle, in shard-iteration order.
    pub(crate) fn some_query(&self) -> Option<QueryRef> {
        self.shards
            .iter()
            .find_map(|shard| shard.established_query(self.id))
    }

    /// Any backend handle, establishing one on the first shard if none
    /// exists. Reading a handle-consistent property from one shard is
    /// sufficient and avoids establishing the rest prematurely.
    pub(crate) fn get_or_establish_some(&self) -> Result<QueryRef, Error> {
        if let Some(query) = self.some_query() {
            return Ok(query);
        }

        let shard = self
            .shards
            .first()
            .ok_or_else(|| Error::invalid_state("query has no shards"))?;

        self.establish_on(shard)
    }

    /// Get-or-establish on one specific shard.
    pub(crate) fn establish_on(&self, shard: &ShardRef) -> Result<QueryRef, Error> {
        shard.establish_query(self.id, self.factory.as_ref())
    }

    pub(crate) fn with_collector<R>(&self, f: impl FnOnce(&ExitCollector) -> R) -> R {
        f(&self.collector.borrow())
    }

    pub(crate) fn with_collector_mut<R>(&self, f: impl FnOnce(&mut ExitCollector) -> R) -> R {
        f(&mut self.collector.borrow_mut())
    }

    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.read_only.set(Some(read_only));
    }

    pub(crate) fn is_read_only_initialized(&self) -> bool {
        self.read_only.get().is_some()
    }

    /// Explicit value wins; otherwise infer the AND of every shard's
    /// session default, skipping shards with no active session.
    pub(crate) fn is_read_only(&self) -> Result<bool, Error> {
        if let Some(read_only) = self.read_only.get() {
            return Ok(read_only);
        }

        if self.shards.is_empty() {
            return Err(Error::invalid_state(
                "cannot infer read-only: not initialized and no shards to consult",
            ));
        }

        let mut default_read_only = true;
        for shard in &self.shards {
            if let Some(session_default) = shard.session_default_read_only() {
                default_read_only &= session_default;
            }
        }

        Ok(default_read_only)
    }
}

///
/// FederatedQuery
///
/// Caller-facing handle over one logical query spanning every shard it
/// was constructed with. Behaves as if a single backend existed: each
/// mutation is routed to every shard (applied or queued), informational
/// reads come from any established handle, and execution scatter-gathers
/// across all shards. Shard-set narrowing is done by constructing a
/// handle over a smaller shard set, never per call.
///

pub struct FederatedQuery {
    core: Rc<QueryCore>,
}

impl std::fmt::Debug for FederatedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedQuery")
            .field("id", &self.core.id())
            .finish_non_exhaustive()
    }
}

impl FederatedQuery {
    #[must_use]
    pub fn builder(factory: Rc<dyn BackendQueryFactory>) -> FederatedQueryBuilder {
        FederatedQueryBuilder::new(factory)
    }

    /// The logical query identifier correlating this handle to its
    /// per-shard slots.
    #[must_use]
    pub fn query_id(&self) -> QueryId {
        self.core.id()
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.core.shards().len()
    }
}

impl QueryOps for FederatedQuery {
    fn mutate(&self, command: QueryCommand) -> Result<(), Error> {
        self.core.mutate(&command)
    }

    fn add_order(&self, order: SortOrder) -> Result<&Self, Error> {
        self.core.with_collector_mut(|c| c.add_order(order));
        Ok(self)
    }

    fn set_projection(&self, projection: Projection) -> Result<&Self, Error> {
        self.core
            .with_collector_mut(|c| c.set_projection(projection.clone()));

        match projection {
            // The one projection kind that cannot be recomputed from
            // merged raw rows: each shard must report (average, count)
            // so the collector can take the weighted mean.
            Projection::Average(field) => {
                self.core.mutate(&QueryCommand::SetProjection(
                    Projection::average_with_count(field),
                ))?;
            }
            Projection::Field(_)
            | Projection::RowCount
            | Projection::Sum(_)
            | Projection::List(_) => {}
        }

        Ok(self)
    }

    fn create_subquery(&self, spec: SubQuerySpec) -> Result<FederatedSubQuery, Error> {
        subquery::create(Rc::clone(&self.core), &spec)
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
        let query = self.core.get_or_establish_some()?;
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

///
/// FederatedQueryBuilder
///
/// Fluent construction of a federated handle: shard set, access
/// strategy (sequential by default), and optionally an explicit
/// read-only flag.
///

pub struct FederatedQueryBuilder {
    shards: Vec<ShardRef>,
    factory: Rc<dyn BackendQueryFactory>,
    access: Rc<dyn ShardAccessStrategy>,
    read_only: Option<bool>,
}

impl FederatedQueryBuilder {
    #[must_use]
    pub fn new(factory: Rc<dyn BackendQueryFactory>) -> Self {
        Self {
            shards: Vec::new(),
            factory,
            access: Rc::new(SequentialAccess),
            read_only: None,
        }
    }

    /// Append one shard. Shard iteration order is the append order and
    /// is preserved through merge.
    #[must_use]
    pub fn shard(mut self, shard: ShardRef) -> Self {
        self.shards.push(shard);
        self
    }

    #[must_use]
    pub fn shards(mut self, shards: impl IntoIterator<Item = ShardRef>) -> Self {
        self.shards.extend(shards);
        self
    }

    #[must_use]
    pub fn access(mut self, access: Rc<dyn ShardAccessStrategy>) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    #[must_use]
    pub fn build(self) -> FederatedQuery {
        let core = QueryCore {
            id: QueryId::generate(),
            shards: self.shards,
            factory: self.factory,
            access: self.access,
            collector: RefCell::new(ExitCollector::new()),
            read_only: Cell::new(self.read_only),
        };
        obs::emit(CoordinationEvent::QueryCreated {
            shard_count: core.shards.len(),
        });

        FederatedQuery {
            core: Rc::new(core),
        }
    }
}
