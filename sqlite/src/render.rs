//! SQL rendering of projection queries.

use plucker_core::scope::{Condition, Direction};
use plucker_core::source::{JoinOn, ProjectionQuery, SourceExpr};
use plucker_core::Value;

/// SQL text plus the values bound to its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Renders `query` as a single `SELECT`.
///
/// ```
/// use plucker_core::scope::{Condition, Filter};
/// use plucker_core::source::{Projection, ProjectionQuery};
/// use plucker_sqlite::render;
///
/// let query = ProjectionQuery::new("authors")
///     .field(Projection::column("id"))
///     .filter(Filter::new().with(Condition::is_in("id", [1, 2])));
/// let rendered = render(&query);
/// assert_eq!(
///     rendered.sql,
///     r#"SELECT "authors"."id" AS "id" FROM "authors" WHERE "authors"."id" IN (?, ?)"#
/// );
/// assert_eq!(rendered.params.len(), 2);
/// ```
pub fn render(query: &ProjectionQuery) -> RenderedQuery {
    let mut writer = SqlWriter::new(&query.table);

    writer.sql.push_str("SELECT ");
    for (i, projection) in query.fields.iter().enumerate() {
        if i > 0 {
            writer.sql.push_str(", ");
        }
        writer.expr(&projection.expr);
        writer.sql.push_str(" AS ");
        writer.ident(&projection.name);
    }

    writer.sql.push_str(" FROM ");
    writer.ident(&query.table);

    for join in &query.joins {
        writer.sql.push_str(" LEFT OUTER JOIN ");
        writer.ident(&join.table);
        writer.sql.push_str(" AS ");
        writer.ident(&join.alias);
        writer.sql.push_str(" ON ");
        for (i, on) in join.on.iter().enumerate() {
            if i > 0 {
                writer.sql.push_str(" AND ");
            }
            match on {
                JoinOn::Columns {
                    base_column,
                    joined_column,
                } => {
                    writer.base_column(base_column);
                    writer.sql.push_str(" = ");
                    writer.column(&join.alias, joined_column);
                }
                JoinOn::Value {
                    joined_column,
                    value,
                } => {
                    writer.column(&join.alias, joined_column);
                    writer.sql.push_str(" = ");
                    writer.param(value);
                }
            }
        }
    }

    for (i, condition) in query.filter.conditions.iter().enumerate() {
        writer
            .sql
            .push_str(if i == 0 { " WHERE " } else { " AND " });
        writer.condition(condition);
    }

    for (i, order) in query.filter.order.iter().enumerate() {
        writer
            .sql
            .push_str(if i == 0 { " ORDER BY " } else { ", " });
        writer.base_column(&order.field);
        writer.sql.push_str(match order.direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }

    RenderedQuery {
        sql: writer.sql,
        params: writer.params,
    }
}

struct SqlWriter<'q> {
    table: &'q str,
    sql: String,
    params: Vec<Value>,
}

impl<'q> SqlWriter<'q> {
    fn new(table: &'q str) -> Self {
        Self {
            table,
            sql: String::with_capacity(128),
            params: Vec::new(),
        }
    }

    /// Writes a double-quoted identifier, doubling embedded quotes.
    fn ident(&mut self, name: &str) {
        self.sql.push('"');
        for c in name.chars() {
            if c == '"' {
                self.sql.push('"');
            }
            self.sql.push(c);
        }
        self.sql.push('"');
    }

    fn column(&mut self, relation: &str, column: &str) {
        self.ident(relation);
        self.sql.push('.');
        self.ident(column);
    }

    fn base_column(&mut self, column: &str) {
        self.column(self.table, column);
    }

    fn param(&mut self, value: &Value) {
        self.sql.push('?');
        self.params.push(value.clone());
    }

    fn expr(&mut self, expr: &SourceExpr) {
        match expr {
            SourceExpr::Column {
                relation: None,
                column,
            } => self.base_column(column),
            SourceExpr::Column {
                relation: Some(relation),
                column,
            } => self.column(relation, column),
            SourceExpr::Coalesce(inner) if inner.is_empty() => self.sql.push_str("NULL"),
            SourceExpr::Coalesce(inner) => {
                // SQLite rejects COALESCE with a single argument.
                self.sql.push_str("COALESCE(NULL");
                for expr in inner {
                    self.sql.push_str(", ");
                    self.expr(expr);
                }
                self.sql.push(')');
            }
        }
    }

    fn condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Eq { field, value } => {
                self.base_column(field);
                self.sql.push_str(" = ");
                self.param(value);
            }
            Condition::In { field, values } => {
                self.base_column(field);
                self.sql.push_str(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.param(value);
                }
                self.sql.push(')');
            }
            Condition::IsNull(field) => {
                self.base_column(field);
                self.sql.push_str(" IS NULL");
            }
            Condition::NotNull(field) => {
                self.base_column(field);
                self.sql.push_str(" IS NOT NULL");
            }
        }
    }
}
