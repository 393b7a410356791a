//! The row source interface and the projection queries it executes.
//!
//! A [`RowSource`] only ever sees fully planned [`ProjectionQuery`] values:
//! a table, an ordered list of output fields with their source expressions,
//! left outer joins, and a [`Filter`]. It answers with one tuple per matched
//! row, in row order, without deduplication.

mod memory;
mod recording;

pub use memory::{MemorySource, Table};
pub use recording::RecordingSource;

use crate::error::Result;
use crate::scope::Filter;
use crate::{Name, Value};

/// One raw tuple; arity equals the projection list of the query that made it.
pub type Row = Vec<Value>;

/// Where an output field's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceExpr {
    /// A column of the base table (`relation: None`) or of a joined alias.
    Column {
        relation: Option<Name>,
        column: Name,
    },
    /// First non-null of the inner expressions, in order.
    Coalesce(Vec<SourceExpr>),
}

impl SourceExpr {
    pub fn column(column: impl Into<Name>) -> Self {
        SourceExpr::Column {
            relation: None,
            column: column.into(),
        }
    }

    pub fn joined(relation: impl Into<Name>, column: impl Into<Name>) -> Self {
        SourceExpr::Column {
            relation: Some(relation.into()),
            column: column.into(),
        }
    }
}

/// `{output name, source expression}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub name: Name,
    pub expr: SourceExpr,
}

impl Projection {
    pub fn new(name: impl Into<Name>, expr: SourceExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// A base-table column projected under its own name.
    pub fn column(name: impl Into<Name>) -> Self {
        let name = name.into();
        Self {
            expr: SourceExpr::column(name.clone()),
            name,
        }
    }
}

/// Condition of a left outer join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// `base.base_column = alias.joined_column`
    Columns { base_column: Name, joined_column: Name },
    /// `alias.joined_column = value`
    Value { joined_column: Name, value: Value },
}

/// `LEFT OUTER JOIN table AS alias ON …`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: Name,
    pub alias: Name,
    pub on: Vec<JoinOn>,
}

/// Everything a row source needs to produce tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionQuery {
    pub table: Name,
    pub fields: Vec<Projection>,
    pub joins: Vec<Join>,
    pub filter: Filter,
}

impl ProjectionQuery {
    pub fn new(table: impl Into<Name>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            joins: Vec::new(),
            filter: Filter::default(),
        }
    }

    pub fn field(mut self, projection: Projection) -> Self {
        self.fields.push(projection);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.fields.iter().map(|p| &p.name)
    }
}

/// A tabular backend able to run projection queries.
///
/// Implementations must keep row order and must not deduplicate rows.
/// Timeouts, cancellation and connection handling are theirs to deal with;
/// the engine never retries.
pub trait RowSource {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>>;
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>> {
        (**self).project(query)
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>> {
        (**self).project(query)
    }
}
