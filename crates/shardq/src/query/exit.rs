use crate::row::Row;

///
/// ExitStrategy
///
/// Stateless merge policy mapping the ordered per-shard raw results to
/// one merged row set. Shard iteration order is preserved into the
/// merge; the coordination layer never re-orders raw results here.
///

pub trait ExitStrategy {
    fn merge(&self, per_shard: Vec<Vec<Row>>) -> Vec<Row>;
}

///
/// ConcatenateListsExit
///
/// Ordered concatenation of every shard's raw list result. Used by
/// `list()`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ConcatenateListsExit;

impl ExitStrategy for ConcatenateListsExit {
    fn merge(&self, per_shard: Vec<Vec<Row>>) -> Vec<Row> {
        per_shard.into_iter().flatten().collect()
    }
}

///
/// FirstNonNullExit
///
/// First non-empty raw result in shard-iteration order. Used by
/// `unique_result()`. All shards empty is a valid outcome, not an error.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct FirstNonNullExit;

impl ExitStrategy for FirstNonNullExit {
    fn merge(&self, per_shard: Vec<Vec<Row>>) -> Vec<Row> {
        per_shard
            .into_iter()
            .find(|rows| !rows.is_empty())
            .unwrap_or_default()
    }
}

///
/// TESTS
///
