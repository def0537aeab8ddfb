use crate::{
    error::Error,
    query::{collector::ExitCollector, exit::ExitStrategy},
    row::Row,
    shard::ShardRef,
};

/// Unit of work the executor hands the access strategy, one invocation
/// per shard: establish that shard's slot, then execute. Safe to retry;
/// establishment is idempotent.
pub type ShardUnitOfWork<'a> = dyn FnMut(&ShardRef) -> Result<Vec<Row>, Error> + 'a;

///
/// ShardAccessStrategy
///
/// Drives the per-shard units of work, merges the raw results through
/// the exit strategy, and runs the post-merge pipeline once over the
/// merged rows. A strategy may retry or parallelize internally, but
/// must hand the exit strategy exactly one raw result per shard, in
/// shard-iteration order, and must apply the collector exactly once.
///

pub trait ShardAccessStrategy {
    fn apply(
        &self,
        shards: &[ShardRef],
        unit: &mut ShardUnitOfWork<'_>,
        exit: &dyn ExitStrategy,
        collector: &ExitCollector,
    ) -> Result<Vec<Row>, Error>;
}

///
/// SequentialAccess
///
/// Default strategy: one shard at a time, in iteration order, failing
/// fast on the first error.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialAccess;

impl ShardAccessStrategy for SequentialAccess {
    fn apply(
        &self,
        shards: &[ShardRef],
        unit: &mut ShardUnitOfWork<'_>,
        exit: &dyn ExitStrategy,
        collector: &ExitCollector,
    ) -> Result<Vec<Row>, Error> {
        let mut per_shard = Vec::with_capacity(shards.len());
        for shard in shards {
            per_shard.push(unit(shard)?);
        }

        collector.apply(exit.merge(per_shard))
    }
}
