//! Federated query coordination.
//!
//! The deferred-mutation contract is the spine of this module: a mutation
//! arriving before a shard's backend query exists is queued on that
//! shard's slot and replayed, in arrival order, when the slot is
//! established; a mutation arriving afterwards is applied directly.

pub mod access;
pub mod collector;
pub mod command;
pub mod exit;
pub mod expr;
pub mod federated;
pub mod ops;
pub mod slot;
pub mod subquery;

pub(crate) mod executor;


pub use access::{SequentialAccess, ShardAccessStrategy, ShardUnitOfWork};
pub use collector::ExitCollector;
pub use command::QueryCommand;
pub use exit::{ConcatenateListsExit, ExitStrategy, FirstNonNullExit};
pub use expr::{
    AliasSpec, CacheMode, CompareOp, CursorMode, FetchMode, Filter, FlushMode, JoinKind, LockMode,
    OrderDirection, Projection, ResultTransformer, SortOrder, SubQuerySpec,
};
pub use federated::{FederatedQuery, FederatedQueryBuilder};
pub use ops::{QueryOps, RowCursor};
pub use slot::{QuerySlot, QuerySlots};
pub use subquery::{FederatedSubQuery, SubQueryRegistrar};
