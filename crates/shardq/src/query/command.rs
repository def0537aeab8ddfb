use crate::{
    error::Error,
    query::{
        expr::{
            AliasSpec, CacheMode, FetchMode, Filter, FlushMode, LockMode, Projection,
            ResultTransformer, SortOrder, SubQuerySpec,
        },
        subquery::SubQueryRegistrar,
    },
    shard::BackendQuery,
};
use std::{fmt, rc::Rc};

///
/// QueryCommand
///
/// Immutable, replayable description of one query mutation. Queued on a
/// shard's slot while unestablished, replayed in arrival order at
/// establishment, applied directly afterwards. A command is applied at
/// most once per backend handle.
///

#[derive(Clone)]
pub enum QueryCommand {
    AddFilter(Filter),
    AddOrder(SortOrder),
    SetProjection(Projection),
    SetFetchMode { path: String, mode: FetchMode },
    SetLockMode { mode: LockMode, alias: Option<String> },
    CreateAlias(AliasSpec),
    CreateSubQuery {
        spec: SubQuerySpec,
        registrar: SubQueryRegistrar,
    },
    SetResultTransformer(Rc<dyn ResultTransformer>),
    SetFetchSize(u32),
    SetTimeout(u32),
    SetCacheable(bool),
    SetCacheRegion(String),
    SetComment(String),
    SetFlushMode(FlushMode),
    SetCacheMode(CacheMode),
}

impl QueryCommand {
    /// Stable per-variant label for observability and debug output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AddFilter(_) => "add_filter",
            Self::AddOrder(_) => "add_order",
            Self::SetProjection(_) => "set_projection",
            Self::SetFetchMode { .. } => "set_fetch_mode",
            Self::SetLockMode { .. } => "set_lock_mode",
            Self::CreateAlias(_) => "create_alias",
            Self::CreateSubQuery { .. } => "create_subquery",
            Self::SetResultTransformer(_) => "set_result_transformer",
            Self::SetFetchSize(_) => "set_fetch_size",
            Self::SetTimeout(_) => "set_timeout",
            Self::SetCacheable(_) => "set_cacheable",
            Self::SetCacheRegion(_) => "set_cache_region",
            Self::SetComment(_) => "set_comment",
            Self::SetFlushMode(_) => "set_flush_mode",
            Self::SetCacheMode(_) => "set_cache_mode",
        }
    }

    /// Apply this command to one backend handle.
    ///
    /// Sub-query creation additionally installs the new backend handle
    /// into the federated sub-query's slot and replays that slot's own
    /// pending queue.
    pub fn apply(&self, query: &mut dyn BackendQuery) -> Result<(), Error> {
        match self {
            Self::AddFilter(filter) => query.add_filter(filter)?,
            Self::AddOrder(order) => query.add_order(order)?,
            Self::SetProjection(projection) => query.set_projection(projection)?,
            Self::SetFetchMode { path, mode } => query.set_fetch_mode(path, *mode)?,
            Self::SetLockMode { mode, alias } => query.set_lock_mode(*mode, alias.as_deref())?,
            Self::CreateAlias(spec) => query.create_alias(spec)?,
            Self::CreateSubQuery { spec, registrar } => {
                let sub = query.create_subquery(spec)?;
                registrar.install(sub)?;
            }
            Self::SetResultTransformer(transformer) => {
                query.set_result_transformer(Rc::clone(transformer))?;
            }
            Self::SetFetchSize(rows) => query.set_fetch_size(*rows)?,
            Self::SetTimeout(seconds) => query.set_timeout(*seconds)?,
            Self::SetCacheable(cacheable) => query.set_cacheable(*cacheable)?,
            Self::SetCacheRegion(region) => query.set_cache_region(region)?,
            Self::SetComment(comment) => query.set_comment(comment)?,
            Self::SetFlushMode(mode) => query.set_flush_mode(*mode)?,
            Self::SetCacheMode(mode) => query.set_cache_mode(*mode)?,
        }

        Ok(())
    }
}

impl fmt::Debug for QueryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
