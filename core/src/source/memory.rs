//! An in-memory row source.
//!
//! Holds plain tables and evaluates projection queries the way a SQL backend
//! would: filter, order, left outer join with fan-out, then project.

use core::cmp::Ordering;

use indexmap::IndexMap;

use super::{Join, JoinOn, ProjectionQuery, Row, RowSource, SourceExpr};
use crate::error::{PluckError, Result};
use crate::scope::Direction;
use crate::{Name, Value};

/// A named table of rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: Name,
    pub columns: Vec<Name>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new<I, N>(name: impl Into<Name>, columns: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row given positionally; short rows are padded with nulls.
    pub fn row<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.push_row(values);
        self
    }

    pub fn push_row<I: IntoIterator<Item = Value>>(&mut self, values: I) {
        let mut row: Row = values.into_iter().collect();
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Appends a row given by column name; unnamed columns are null.
    pub fn insert<I, N, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Value>,
    {
        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in values {
            if let Some(idx) = self.position(name.as_ref()) {
                row[idx] = value.into();
            }
        }
        self.rows.push(row);
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.position(column).ok_or_else(|| {
            PluckError::backend(format!("no such column: {}.{column}", self.name))
        })
    }
}

/// Tables held in memory, queried through [`RowSource`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: IndexMap<Name, Table>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    fn lookup(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| PluckError::backend(format!("no such table: {name}")))
    }
}

/// A join with its column positions resolved.
struct ResolvedJoin<'t> {
    alias: &'t Name,
    table: &'t Table,
    columns: Vec<(usize, usize)>,
    values: Vec<(usize, &'t Value)>,
}

impl<'t> ResolvedJoin<'t> {
    fn resolve(source: &'t MemorySource, base: &Table, join: &'t Join) -> Result<Self> {
        let table = source.lookup(&join.table)?;
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for on in &join.on {
            match on {
                JoinOn::Columns {
                    base_column,
                    joined_column,
                } => columns.push((base.require(base_column)?, table.require(joined_column)?)),
                JoinOn::Value {
                    joined_column,
                    value,
                } => values.push((table.require(joined_column)?, value)),
            }
        }
        Ok(Self {
            alias: &join.alias,
            table,
            columns,
            values,
        })
    }

    fn matches(&self, base: &Row, joined: &Row) -> bool {
        self.columns
            .iter()
            .all(|&(b, j)| base[b].is_key() && base[b] == joined[j])
            && self.values.iter().all(|&(j, v)| &joined[j] == v)
    }
}

/// One combination of joined rows for a base row.
type Frame<'t> = Vec<Option<&'t Row>>;

impl RowSource for MemorySource {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>> {
        let base = self.lookup(&query.table)?;

        let conditions = query
            .filter
            .conditions
            .iter()
            .map(|c| Ok((base.require(c.field())?, c)))
            .collect::<Result<Vec<_>>>()?;
        let order = query
            .filter
            .order
            .iter()
            .map(|o| Ok((base.require(&o.field)?, o.direction)))
            .collect::<Result<Vec<_>>>()?;
        let joins = query
            .joins
            .iter()
            .map(|j| ResolvedJoin::resolve(self, base, j))
            .collect::<Result<Vec<_>>>()?;

        let mut selected: Vec<&Row> = base
            .rows
            .iter()
            .filter(|row| conditions.iter().all(|(idx, c)| c.matches(&row[*idx])))
            .collect();

        if !order.is_empty() {
            selected.sort_by(|a, b| {
                order
                    .iter()
                    .map(|&(idx, direction)| match direction {
                        Direction::Asc => a[idx].sort_cmp(&b[idx]),
                        Direction::Desc => b[idx].sort_cmp(&a[idx]),
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let mut out = Vec::with_capacity(selected.len());
        for row in selected {
            let mut frames: Vec<Frame<'_>> = vec![Vec::with_capacity(joins.len())];
            for join in &joins {
                let matched: Vec<&Row> = join
                    .table
                    .rows
                    .iter()
                    .filter(|joined| join.matches(row, joined))
                    .collect();
                frames = frames
                    .into_iter()
                    .flat_map(|frame| {
                        if matched.is_empty() {
                            let mut next = frame;
                            next.push(None);
                            vec![next]
                        } else {
                            matched
                                .iter()
                                .map(|m| {
                                    let mut next = frame.clone();
                                    next.push(Some(*m));
                                    next
                                })
                                .collect()
                        }
                    })
                    .collect();
            }

            for frame in &frames {
                let tuple = query
                    .fields
                    .iter()
                    .map(|p| eval(&p.expr, base, row, &joins, frame))
                    .collect::<Result<Row>>()?;
                out.push(tuple);
            }
        }
        Ok(out)
    }
}

fn eval(
    expr: &SourceExpr,
    base: &Table,
    row: &Row,
    joins: &[ResolvedJoin<'_>],
    frame: &Frame<'_>,
) -> Result<Value> {
    match expr {
        SourceExpr::Column {
            relation: None,
            column,
        } => Ok(row[base.require(column)?].clone()),
        SourceExpr::Column {
            relation: Some(alias),
            column,
        } => {
            let idx = joins
                .iter()
                .position(|j| j.alias == alias)
                .ok_or_else(|| PluckError::backend(format!("no such join alias: {alias}")))?;
            let col = joins[idx].table.require(column)?;
            Ok(frame[idx].map_or(Value::Null, |joined| joined[col].clone()))
        }
        SourceExpr::Coalesce(inner) => {
            for expr in inner {
                let value = eval(expr, base, row, joins, frame)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Ok(Value::Null)
        }
    }
}
