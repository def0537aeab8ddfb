//! Coordination core for federated queries: one caller-facing handle per
//! logical query, fanned out across independent backend shards.
//!
//! Per-shard backend queries are established lazily, on first execution
//! need. Mutations issued earlier are queued per shard and replayed in
//! arrival order at establishment; mutations issued later are applied
//! directly. Execution scatter-gathers every shard, merges raw results
//! through an exit strategy, and applies global semantics (projection,
//! ordering, offset, limit) exactly once, after merge.
//!
//! ## Crate layout
//! - `error`: coordination error taxonomy and backend propagation.
//! - `id`: logical query identifiers.
//! - `obs`: coordination telemetry behind a sink boundary.
//! - `query`: commands, slots, handles, merge policies, post-merge ops.
//! - `row` / `value`: the opaque raw-result data model.
//! - `shard`: the external collaborator boundary (shards, backends).
#![warn(unreachable_pub)]

pub mod error;
pub mod id;
pub mod obs;
pub mod query;
pub mod row;
pub mod shard;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, slots, executors, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        id::QueryId,
        query::{
            FederatedQuery, FederatedSubQuery, Filter, OrderDirection, Projection, QueryOps,
            SortOrder, SubQuerySpec,
        },
        row::Row,
        shard::ShardId,
        value::Value,
    };
}
