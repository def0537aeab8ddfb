//! Shared test doubles: a slot-delegating mock shard, a recording
//! backend query, and factories with scriptable results.

use crate::{
    error::{BackendError, Error},
    id::QueryId,
    query::{
        command::QueryCommand,
        expr::{
            AliasSpec, CacheMode, FetchMode, Filter, FlushMode, LockMode, Projection,
            ResultTransformer, SortOrder, SubQuerySpec,
        },
        slot::QuerySlots,
    },
    row::Row,
    shard::{BackendQuery, BackendQueryFactory, QueryRef, Shard, ShardId},
};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
};

///
/// OpLog
/// Per-shard record of every backend call, in call order.
///

#[derive(Default)]
pub(crate) struct OpLog {
    entries: RefCell<BTreeMap<ShardId, Vec<String>>>,
}

impl OpLog {
    fn push(&self, shard: ShardId, entry: String) {
        self.entries.borrow_mut().entry(shard).or_default().push(entry);
    }

    pub(crate) fn of(&self, shard: ShardId) -> Vec<String> {
        self.entries
            .borrow()
            .get(&shard)
            .cloned()
            .unwrap_or_default()
    }
}

///
/// RecordingQuery
/// Backend query double: logs every call, returns scripted results.
/// Sub-queries share the log with a `path.` prefix on their entries.
///

pub(crate) struct RecordingQuery {
    shard: ShardId,
    log: Rc<OpLog>,
    prefix: String,
    alias: Option<String>,
    rows: Vec<Row>,
    unique: Option<Row>,
}

impl RecordingQuery {
    fn push(&self, entry: String) {
        self.log.push(self.shard, format!("{}{entry}", self.prefix));
    }
}

impl BackendQuery for RecordingQuery {
    fn add_filter(&mut self, filter: &Filter) -> Result<(), BackendError> {
        self.push(format!(
            "add_filter({} {:?} {:?})",
            filter.field, filter.op, filter.value
        ));
        Ok(())
    }

    fn add_order(&mut self, order: &SortOrder) -> Result<(), BackendError> {
        self.push(format!("add_order({} {:?})", order.field, order.direction));
        Ok(())
    }

    fn set_projection(&mut self, projection: &Projection) -> Result<(), BackendError> {
        self.push(format!("set_projection({projection:?})"));
        Ok(())
    }

    fn set_fetch_mode(&mut self, path: &str, mode: FetchMode) -> Result<(), BackendError> {
        self.push(format!("set_fetch_mode({path} {mode:?})"));
        Ok(())
    }

    fn set_lock_mode(&mut self, mode: LockMode, alias: Option<&str>) -> Result<(), BackendError> {
        self.push(format!("set_lock_mode({mode:?} {alias:?})"));
        Ok(())
    }

    fn create_alias(&mut self, spec: &AliasSpec) -> Result<(), BackendError> {
        self.push(format!("create_alias({} {})", spec.path, spec.alias));
        Ok(())
    }

    fn set_result_transformer(
        &mut self,
        _transformer: Rc<dyn ResultTransformer>,
    ) -> Result<(), BackendError> {
        self.push("set_result_transformer".to_string());
        Ok(())
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), BackendError> {
        self.push(format!("set_fetch_size({rows})"));
        Ok(())
    }

    fn set_timeout(&mut self, seconds: u32) -> Result<(), BackendError> {
        self.push(format!("set_timeout({seconds})"));
        Ok(())
    }

    fn set_cacheable(&mut self, cacheable: bool) -> Result<(), BackendError> {
        self.push(format!("set_cacheable({cacheable})"));
        Ok(())
    }

    fn set_cache_region(&mut self, region: &str) -> Result<(), BackendError> {
        self.push(format!("set_cache_region({region})"));
        Ok(())
    }

    fn set_comment(&mut self, comment: &str) -> Result<(), BackendError> {
        self.push(format!("set_comment({comment})"));
        Ok(())
    }

    fn set_flush_mode(&mut self, mode: FlushMode) -> Result<(), BackendError> {
        self.push(format!("set_flush_mode({mode:?})"));
        Ok(())
    }

    fn set_cache_mode(&mut self, mode: CacheMode) -> Result<(), BackendError> {
        self.push(format!("set_cache_mode({mode:?})"));
        Ok(())
    }

    fn alias(&self) -> Option<String> {
        self.alias.clone()
    }

    fn create_subquery(&mut self, spec: &SubQuerySpec) -> Result<QueryRef, BackendError> {
        self.push(format!("create_subquery({})", spec.path));

        Ok(Rc::new(RefCell::new(Self {
            shard: self.shard,
            log: Rc::clone(&self.log),
            prefix: format!("{}{}.", self.prefix, spec.path),
            alias: spec.alias.clone(),
            rows: Vec::new(),
            unique: None,
        })))
    }

    fn list(&mut self) -> Result<Vec<Row>, BackendError> {
        self.push("list()".to_string());
        Ok(self.rows.clone())
    }

    fn unique_result(&mut self) -> Result<Option<Row>, BackendError> {
        self.push("unique_result()".to_string());
        Ok(self.unique.clone())
    }
}

///
/// RecordingFactory
/// Creates `RecordingQuery` handles with per-shard scripted results.
///

#[derive(Default)]
pub(crate) struct RecordingFactory {
    log: Rc<OpLog>,
    created: RefCell<Vec<ShardId>>,
    alias: Option<String>,
    rows: RefCell<BTreeMap<ShardId, Vec<Row>>>,
    uniques: RefCell<BTreeMap<ShardId, Row>>,
}

impl RecordingFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::default()
        }
    }

    pub(crate) fn rows_for(&self, shard: u32, rows: Vec<Row>) {
        self.rows.borrow_mut().insert(ShardId(shard), rows);
    }

    pub(crate) fn unique_for(&self, shard: u32, row: Row) {
        self.uniques.borrow_mut().insert(ShardId(shard), row);
    }

    pub(crate) fn log(&self, shard: ShardId) -> Vec<String> {
        self.log.of(shard)
    }

    pub(crate) fn created(&self) -> Vec<ShardId> {
        self.created.borrow().clone()
    }
}

impl BackendQueryFactory for RecordingFactory {
    fn create(&self, shard: ShardId) -> Result<QueryRef, BackendError> {
        self.created.borrow_mut().push(shard);

        Ok(Rc::new(RefCell::new(RecordingQuery {
            shard,
            log: Rc::clone(&self.log),
            prefix: String::new(),
            alias: self.alias.clone(),
            rows: self.rows.borrow().get(&shard).cloned().unwrap_or_default(),
            unique: self.uniques.borrow().get(&shard).cloned(),
        })))
    }
}

///
/// FailingFactory
/// Backend creation always fails.
///

pub(crate) struct FailingFactory;

impl BackendQueryFactory for FailingFactory {
    fn create(&self, _shard: ShardId) -> Result<QueryRef, BackendError> {
        Err(BackendError::new("factory offline"))
    }
}

///
/// RejectingQuery / RejectingFactory
/// Backend that rejects every mutation and execution call.
///

struct RejectingQuery;

impl RejectingQuery {
    fn rejected<T>() -> Result<T, BackendError> {
        Err(BackendError::new("rejected by backend"))
    }
}

impl BackendQuery for RejectingQuery {
    fn add_filter(&mut self, _filter: &Filter) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn add_order(&mut self, _order: &SortOrder) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_projection(&mut self, _projection: &Projection) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_fetch_mode(&mut self, _path: &str, _mode: FetchMode) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_lock_mode(&mut self, _mode: LockMode, _alias: Option<&str>) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn create_alias(&mut self, _spec: &AliasSpec) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_result_transformer(
        &mut self,
        _transformer: Rc<dyn ResultTransformer>,
    ) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_fetch_size(&mut self, _rows: u32) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_timeout(&mut self, _seconds: u32) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_cacheable(&mut self, _cacheable: bool) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_cache_region(&mut self, _region: &str) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_comment(&mut self, _comment: &str) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_flush_mode(&mut self, _mode: FlushMode) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn set_cache_mode(&mut self, _mode: CacheMode) -> Result<(), BackendError> {
        Self::rejected()
    }

    fn alias(&self) -> Option<String> {
        None
    }

    fn create_subquery(&mut self, _spec: &SubQuerySpec) -> Result<QueryRef, BackendError> {
        Self::rejected()
    }

    fn list(&mut self) -> Result<Vec<Row>, BackendError> {
        Self::rejected()
    }

    fn unique_result(&mut self) -> Result<Option<Row>, BackendError> {
        Self::rejected()
    }
}

pub(crate) struct RejectingFactory;

impl BackendQueryFactory for RejectingFactory {
    fn create(&self, _shard: ShardId) -> Result<QueryRef, BackendError> {
        Ok(Rc::new(RefCell::new(RejectingQuery)))
    }
}

///
/// MockShard
/// Shard double owning its slot state through `QuerySlots`, the way a
/// real shard implementation is expected to.
///

pub(crate) struct MockShard {
    id: ShardId,
    slots: RefCell<QuerySlots>,
    session_read_only: Option<bool>,
}

impl MockShard {
    pub(crate) fn new(id: u32) -> Rc<Self> {
        Rc::new(Self {
            id: ShardId(id),
            slots: RefCell::new(QuerySlots::new()),
            session_read_only: None,
        })
    }

    pub(crate) fn with_session(id: u32, read_only: Option<bool>) -> Rc<Self> {
        Rc::new(Self {
            id: ShardId(id),
            slots: RefCell::new(QuerySlots::new()),
            session_read_only: read_only,
        })
    }

    pub(crate) fn pending_len(&self, id: QueryId) -> usize {
        self.slots.borrow().pending_len(id)
    }

    pub(crate) fn is_established(&self, id: QueryId) -> bool {
        self.slots.borrow().established(id).is_some()
    }
}

impl Shard for MockShard {
    fn shard_id(&self) -> ShardId {
        self.id
    }

    fn established_query(&self, id: QueryId) -> Option<QueryRef> {
        self.slots.borrow().established(id)
    }

    fn establish_query(
        &self,
        id: QueryId,
        factory: &dyn BackendQueryFactory,
    ) -> Result<QueryRef, Error> {
        self.slots.borrow_mut().establish(id, self.id, factory)
    }

    fn enqueue_command(&self, id: QueryId, command: QueryCommand) {
        self.slots.borrow_mut().enqueue(id, command);
    }

    fn session_default_read_only(&self) -> Option<bool> {
        self.session_read_only
    }
}
