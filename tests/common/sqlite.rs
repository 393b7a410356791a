use plucker::prelude::*;
use rusqlite::{params_from_iter, Connection};

/// An in-memory SQLite database holding the fixture tables.
pub fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    for table in super::tables() {
        create_table(&conn, &table);
    }
    conn
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table(conn: &Connection, table: &Table) {
    let columns: Vec<String> = table.columns.iter().map(|c| quote(c)).collect();
    conn.execute(
        &format!("CREATE TABLE {} ({})", quote(&table.name), columns.join(", ")),
        [],
    )
    .expect("Failed to create table");

    let placeholders = vec!["?"; table.columns.len()].join(", ");
    let insert = format!("INSERT INTO {} VALUES ({placeholders})", quote(&table.name));
    for row in &table.rows {
        conn.execute(&insert, params_from_iter(row.iter()))
            .expect("Failed to insert fixture row");
    }
}
