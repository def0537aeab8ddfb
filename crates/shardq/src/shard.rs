use crate::{
    error::{BackendError, Error},
    id::QueryId,
    query::{
        command::QueryCommand,
        expr::{
            AliasSpec, CacheMode, FetchMode, Filter, FlushMode, LockMode, Projection,
            ResultTransformer, SortOrder, SubQuerySpec,
        },
    },
    row::Row,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};

///
/// ShardId
///
/// Identifies one backend partition within a handle's shard set.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("shard-{_0}")]
#[repr(transparent)]
pub struct ShardId(pub u32);

/// Shared shard reference. The coordination layer is single-caller; shards
/// are shared between a handle and its sub-queries by reference count.
pub type ShardRef = Rc<dyn Shard>;

/// Shared backend query handle.
pub type QueryRef = Rc<RefCell<dyn BackendQuery>>;

///
/// BackendQuery
///
/// One live backend query on one shard. Accepts each mutation command kind
/// as a direct call, executes, and may raise backend-specific errors. The
/// coordination layer treats all operands as opaque.
///

pub trait BackendQuery {
    fn add_filter(&mut self, filter: &Filter) -> Result<(), BackendError>;

    fn add_order(&mut self, order: &SortOrder) -> Result<(), BackendError>;

    fn set_projection(&mut self, projection: &Projection) -> Result<(), BackendError>;

    fn set_fetch_mode(&mut self, path: &str, mode: FetchMode) -> Result<(), BackendError>;

    /// `alias` scopes the lock to one aliased entity when present.
    fn set_lock_mode(&mut self, mode: LockMode, alias: Option<&str>) -> Result<(), BackendError>;

    fn create_alias(&mut self, spec: &AliasSpec) -> Result<(), BackendError>;

    fn set_result_transformer(
        &mut self,
        transformer: Rc<dyn ResultTransformer>,
    ) -> Result<(), BackendError>;

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), BackendError>;

    fn set_timeout(&mut self, seconds: u32) -> Result<(), BackendError>;

    fn set_cacheable(&mut self, cacheable: bool) -> Result<(), BackendError>;

    fn set_cache_region(&mut self, region: &str) -> Result<(), BackendError>;

    fn set_comment(&mut self, comment: &str) -> Result<(), BackendError>;

    fn set_flush_mode(&mut self, mode: FlushMode) -> Result<(), BackendError>;

    fn set_cache_mode(&mut self, mode: CacheMode) -> Result<(), BackendError>;

    /// Root alias of this query, if the backend assigned one.
    fn alias(&self) -> Option<String>;

    /// Create a backend sub-query over an association path.
    fn create_subquery(&mut self, spec: &SubQuerySpec) -> Result<QueryRef, BackendError>;

    fn list(&mut self) -> Result<Vec<Row>, BackendError>;

    fn unique_result(&mut self) -> Result<Option<Row>, BackendError>;
}

///
/// BackendQueryFactory
///
/// Creates a live backend query for one shard. Session and connection
/// management live behind this boundary.
///

pub trait BackendQueryFactory {
    fn create(&self, shard: ShardId) -> Result<QueryRef, BackendError>;
}

///
/// Shard
///
/// One backend partition. Owns the per-identifier slot state: zero or one
/// established query per logical query id, plus an ordered pending-command
/// queue while unestablished. Implementations typically delegate the slot
/// state machine to [`crate::query::slot::QuerySlots`].
///

pub trait Shard {
    fn shard_id(&self) -> ShardId;

    /// The established query for `id`, if the slot has transitioned.
    fn established_query(&self, id: QueryId) -> Option<QueryRef>;

    /// Return the established query for `id`, establishing it first if
    /// needed: create the handle via `factory`, replay every queued
    /// command in arrival order, then publish the handle.
    fn establish_query(
        &self,
        id: QueryId,
        factory: &dyn BackendQueryFactory,
    ) -> Result<QueryRef, Error>;

    /// Append a command to the pending queue for `id`. Only called while
    /// the slot is unestablished.
    fn enqueue_command(&self, id: QueryId, command: QueryCommand);

    /// Default read-only flag of this shard's active session. `None` when
    /// no session is active; skipped (not treated as writable) by the
    /// read-only inference.
    fn session_default_read_only(&self) -> Option<bool>;
}
