use crate::{
    error::Error,
    query::{
        command::QueryCommand,
        expr::{
            AliasSpec, CacheMode, CursorMode, FetchMode, Filter, FlushMode, JoinKind, LockMode,
            Projection, ResultTransformer, SortOrder, SubQuerySpec,
        },
        subquery::FederatedSubQuery,
    },
    row::Row,
};
use std::rc::Rc;

///
/// RowCursor
///
/// Uninhabited: cursor-based streaming is excluded by scope. The methods
/// that would produce one always fail with `Error::Unsupported`.
///

#[derive(Debug)]
pub enum RowCursor {}

///
/// QueryOps
///
/// The capability set shared by the federated handle and its sub-query
/// wrapper: mutate (two-mode dispatch per command), inform (read from
/// any established handle), execute (scatter-gather).
///
/// Mutation methods are fluent; distributed mutations return `Result`
/// because a backend may reject them, central-only recorders cannot
/// fail.
///

pub trait QueryOps {
    /// Route one command through the two-mode dispatch: applied
    /// immediately wherever a backend handle is established, queued in
    /// arrival order everywhere else.
    fn mutate(&self, command: QueryCommand) -> Result<(), Error>;

    // ------------------------------------------------------------------
    // Distributed mutations
    // ------------------------------------------------------------------

    fn add_filter(&self, filter: Filter) -> Result<&Self, Error> {
        self.mutate(QueryCommand::AddFilter(filter))?;
        Ok(self)
    }

    fn set_fetch_mode(&self, path: impl Into<String>, mode: FetchMode) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::SetFetchMode {
            path: path.into(),
            mode,
        })?;
        Ok(self)
    }

    fn set_lock_mode(&self, mode: LockMode) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetLockMode { mode, alias: None })?;
        Ok(self)
    }

    /// Lock-mode variant scoped to one aliased entity.
    fn set_lock_mode_for(&self, alias: impl Into<String>, mode: LockMode) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::SetLockMode {
            mode,
            alias: Some(alias.into()),
        })?;
        Ok(self)
    }

    fn create_alias(
        &self,
        path: impl Into<String>,
        alias: impl Into<String>,
    ) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::CreateAlias(AliasSpec::new(path, alias)))?;
        Ok(self)
    }

    fn create_alias_joined(
        &self,
        path: impl Into<String>,
        alias: impl Into<String>,
        join: JoinKind,
    ) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::CreateAlias(
            AliasSpec::new(path, alias).joined(join),
        ))?;
        Ok(self)
    }

    /// Alias creation with a join restriction. Delegates like its
    /// siblings; every alias overload routes through the same dispatch.
    fn create_alias_with(
        &self,
        path: impl Into<String>,
        alias: impl Into<String>,
        join: JoinKind,
        with: Filter,
    ) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::CreateAlias(
            AliasSpec::new(path, alias).joined(join).with(with),
        ))?;
        Ok(self)
    }

    fn set_result_transformer(
        &self,
        transformer: Rc<dyn ResultTransformer>,
    ) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetResultTransformer(transformer))?;
        Ok(self)
    }

    fn set_fetch_size(&self, rows: u32) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetFetchSize(rows))?;
        Ok(self)
    }

    fn set_timeout(&self, seconds: u32) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetTimeout(seconds))?;
        Ok(self)
    }

    fn set_cacheable(&self, cacheable: bool) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetCacheable(cacheable))?;
        Ok(self)
    }

    fn set_cache_region(&self, region: impl Into<String>) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::SetCacheRegion(region.into()))?;
        Ok(self)
    }

    fn set_comment(&self, comment: impl Into<String>) -> Result<&Self, Error>
    where
        Self: Sized,
    {
        self.mutate(QueryCommand::SetComment(comment.into()))?;
        Ok(self)
    }

    fn set_flush_mode(&self, mode: FlushMode) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetFlushMode(mode))?;
        Ok(self)
    }

    fn set_cache_mode(&self, mode: CacheMode) -> Result<&Self, Error> {
        self.mutate(QueryCommand::SetCacheMode(mode))?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Divergent mutations (routing differs between handle and sub-query)
    // ------------------------------------------------------------------

    /// Append a sort key. On the top-level handle this is recorded
    /// centrally and applied to the merged rows; on a sub-query it is
    /// distributed to the per-shard sub-handles.
    fn add_order(&self, order: SortOrder) -> Result<&Self, Error>;

    /// Record the global projection. An `Average` projection is rewritten
    /// into a distributed (average, row-count) pair on the top-level
    /// handle.
    fn set_projection(&self, projection: Projection) -> Result<&Self, Error>;

    fn create_subquery(&self, spec: SubQuerySpec) -> Result<FederatedSubQuery, Error>;

    // ------------------------------------------------------------------
    // Central-only recorders
    // ------------------------------------------------------------------

    /// Global row limit; applied once, after merge and ordering, never
    /// distributed (a per-shard limit would drop valid cross-shard rows).
    fn set_max_results(&self, limit: u32) -> &Self;

    /// Global row offset; same constraint as `set_max_results`.
    fn set_first_result(&self, offset: u32) -> &Self;

    fn set_read_only(&self, read_only: bool) -> &Self;

    // ------------------------------------------------------------------
    // Informational
    // ------------------------------------------------------------------

    fn is_read_only_initialized(&self) -> bool;

    fn is_read_only(&self) -> Result<bool, Error>;

    /// Root alias, read from any established handle (establishing one on
    /// demand; the value is consistent across shards by construction).
    fn alias(&self) -> Result<Option<String>, Error>;

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    fn list(&self) -> Result<Vec<Row>, Error>;

    fn unique_result(&self) -> Result<Option<Row>, Error>;

    /// Unsupported. This is a scope decision, not a technical decision.
    fn cursor(&self) -> Result<RowCursor, Error> {
        Err(Error::Unsupported("cursor streaming"))
    }

    /// Unsupported. This is a scope decision, not a technical decision.
    fn cursor_with(&self, _mode: CursorMode) -> Result<RowCursor, Error> {
        Err(Error::Unsupported("cursor streaming"))
    }
}
