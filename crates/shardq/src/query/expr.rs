use crate::{row::Row, value::Value};
use serde::{Deserialize, Serialize};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

///
/// Filter
///
/// Opaque restriction passed through to backend queries. The coordination
/// layer never evaluates filters; it only routes them.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Filter {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Filter {
    #[must_use]
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, CompareOp::Like, Value::Text(pattern.into()))
    }
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

///
/// SortOrder
///
/// One sort key. Top-level sort keys are applied to the merged row set,
/// never per shard.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: OrderDirection,
}

impl SortOrder {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

///
/// Projection
///
/// Closed projection variant. Average is a first-class kind so the rewrite
/// into a distributed (average, row-count) pair is one case of an
/// exhaustive match rather than a runtime type check.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Projection {
    /// Extract a single named column per row.
    Field(String),
    /// Count of merged rows.
    RowCount,
    /// Sum of a numeric column over merged rows.
    Sum(String),
    /// Statistically-correct global average of a numeric column.
    Average(String),
    /// Multi-column projection.
    List(Vec<Projection>),
}

impl Projection {
    /// The two-column shape distributed to every shard when an average is
    /// requested: per-shard average plus per-shard row count, so the
    /// merged average can be recomputed as a weighted mean.
    #[must_use]
    pub fn average_with_count(field: impl Into<String>) -> Self {
        let field = field.into();

        Self::List(vec![Self::Average(field), Self::RowCount])
    }
}

///
/// FetchMode
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FetchMode {
    #[default]
    Default,
    Select,
    Join,
}

///
/// LockMode
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LockMode {
    None,
    Read,
    Upgrade,
    UpgradeNoWait,
    Write,
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

///
/// FlushMode
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FlushMode {
    Manual,
    Commit,
    Auto,
    Always,
}

///
/// CacheMode
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CacheMode {
    Normal,
    Ignore,
    Get,
    Put,
    Refresh,
}

///
/// CursorMode
///
/// Accepted for signature parity only; cursor execution is a scope
/// exclusion and always fails.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CursorMode {
    ForwardOnly,
    Insensitive,
    Sensitive,
}

///
/// AliasSpec
///
/// Alias creation payload: association path, alias name, optional join
/// kind, optional join restriction.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AliasSpec {
    pub path: String,
    pub alias: String,
    pub join: Option<JoinKind>,
    pub with: Option<Filter>,
}

impl AliasSpec {
    #[must_use]
    pub fn new(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
            join: None,
            with: None,
        }
    }

    #[must_use]
    pub fn joined(mut self, join: JoinKind) -> Self {
        self.join = Some(join);
        self
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.with = Some(filter);
        self
    }
}

///
/// SubQuerySpec
///
/// Sub-query creation payload over an association path.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubQuerySpec {
    pub path: String,
    pub alias: Option<String>,
    pub join: Option<JoinKind>,
    pub with: Option<Filter>,
}

impl SubQuerySpec {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            join: None,
            with: None,
        }
    }

    #[must_use]
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn joined(mut self, join: JoinKind) -> Self {
        self.join = Some(join);
        self
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.with = Some(filter);
        self
    }
}

///
/// ResultTransformer
///
/// Opaque per-row transformation installed on backend queries. Passed
/// through by reference count; never invoked by the coordination layer.
///

pub trait ResultTransformer {
    fn transform(&self, row: Row) -> Row;
}
