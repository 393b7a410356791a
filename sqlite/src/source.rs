use plucker_core::source::{ProjectionQuery, Row, RowSource};
use plucker_core::{Result, Value};
use rusqlite::{params_from_iter, Connection, Statement};

use crate::render::{render, RenderedQuery};

/// Runs projection queries on a borrowed SQLite connection.
///
/// Statements go through the connection's prepared statement cache, so
/// repeated extractions with the same shape are only prepared once.
///
/// ```
/// use plucker_core::prelude::*;
/// use plucker_sqlite::SqliteSource;
///
/// let conn = rusqlite::Connection::open_in_memory().unwrap();
/// conn.execute_batch(
///     "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT);
///      INSERT INTO authors VALUES (1, 'Ann'), (2, 'Bob');",
/// )
/// .unwrap();
///
/// let registry = SchemaRegistry::builder()
///     .entity(EntitySchema::new("Author", "authors").fields(["name"]))
///     .build();
/// let source = SqliteSource::new(&conn);
/// let records = Extractor::new(&source, &registry)
///     .extract(
///         &Scope::all("Author").order_by(OrderBy::desc("id")),
///         &ExtractionSpec::new().attributes(["name"]),
///     )
///     .unwrap();
/// assert_eq!(records[0], record! { "id" => 2, "name" => "Bob" });
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqliteSource<'c> {
    conn: &'c Connection,
    cached: bool,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, cached: true }
    }

    /// Prepares every statement from scratch instead of using the cache.
    pub fn uncached(mut self) -> Self {
        self.cached = false;
        self
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    fn run(&self, rendered: &RenderedQuery, arity: usize) -> rusqlite::Result<Vec<Row>> {
        if self.cached {
            let mut stmt = self.conn.prepare_cached(&rendered.sql)?;
            query_rows(&mut stmt, &rendered.params, arity)
        } else {
            let mut stmt = self.conn.prepare(&rendered.sql)?;
            query_rows(&mut stmt, &rendered.params, arity)
        }
    }
}

fn query_rows(stmt: &mut Statement<'_>, params: &[Value], arity: usize) -> rusqlite::Result<Vec<Row>> {
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(read_row(row, arity)?);
    }
    Ok(out)
}

fn read_row(row: &rusqlite::Row<'_>, arity: usize) -> rusqlite::Result<Row> {
    (0..arity).map(|i| row.get::<_, Value>(i)).collect()
}

impl RowSource for SqliteSource<'_> {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>> {
        plucker_core::plucker_profile_scope!("sqlite", query.table.as_str());
        let rendered = render(query);
        plucker_core::plucker_trace_sql!(rendered.sql, rendered.params.len());
        Ok(self.run(&rendered, query.fields.len())?)
    }
}
