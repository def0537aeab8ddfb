use crate::{
    error::Error,
    obs::{self, CoordinationEvent, ExecKind},
    query::{
        exit::{ConcatenateListsExit, FirstNonNullExit},
        federated::QueryCore,
    },
    row::Row,
    shard::ShardRef,
};

/// Scatter-gather `list()`: establish-then-execute on every shard,
/// concatenate in shard-iteration order, then the post-merge pipeline
/// runs exactly once over the merged rows.
///
/// Shard selection is not supported here; all known shards are always
/// targeted. A narrower query is built by constructing a handle over a
/// smaller shard set.
pub(crate) fn list(core: &QueryCore) -> Result<Vec<Row>, Error> {
    obs::emit(CoordinationEvent::ExecStart {
        kind: ExecKind::List,
    });

    let mut unit = |shard: &ShardRef| -> Result<Vec<Row>, Error> {
        let query = core.establish_on(shard)?;
        let rows = query.borrow_mut().list()?;

        Ok(rows)
    };

    let rows = core.with_collector(|collector| {
        core.access()
            .apply(core.shards(), &mut unit, &ConcatenateListsExit, collector)
    })?;

    obs::emit(CoordinationEvent::ExecFinish {
        kind: ExecKind::List,
        rows: u64::try_from(rows.len()).unwrap_or(u64::MAX),
    });

    Ok(rows)
}

/// Scatter-gather `unique_result()`: first non-empty per-shard result in
/// shard-iteration order. All shards empty is a valid absent result.
pub(crate) fn unique(core: &QueryCore) -> Result<Option<Row>, Error> {
    obs::emit(CoordinationEvent::ExecStart {
        kind: ExecKind::Unique,
    });

    let mut unit = |shard: &ShardRef| -> Result<Vec<Row>, Error> {
        let query = core.establish_on(shard)?;
        let row = query.borrow_mut().unique_result()?;

        Ok(row.into_iter().collect())
    };

    let rows = core.with_collector(|collector| {
        core.access()
            .apply(core.shards(), &mut unit, &FirstNonNullExit, collector)
    })?;
    let row = rows.into_iter().next();

    obs::emit(CoordinationEvent::ExecFinish {
        kind: ExecKind::Unique,
        rows: u64::from(row.is_some()),
    });

    Ok(row)
}
