#![cfg(feature = "rusqlite")]

mod common;

use common::{memory_source, registry, setup_db, values};
use plucker::prelude::*;
use plucker::sqlite::render;

fn v(value: impl Into<Value>) -> Value {
    value.into()
}

fn blog_spec() -> ExtractionSpec {
    ExtractionSpec::new()
        .attributes(["name", "email"])
        .relation(
            "blog_posts",
            ExtractionSpec::new()
                .attributes(["title", "text"])
                .localized("es", ["text"])
                .relation("categories", ExtractionSpec::new().attributes(["name"]))
                .relation("references", ExtractionSpec::new().ids_only())
                .polymorphic(
                    "subject",
                    [
                        ("Author", ExtractionSpec::new().attributes(["name"])),
                        ("Category", ExtractionSpec::new().attributes(["name"])),
                    ],
                )
                .relation("editor", ExtractionSpec::new().attributes(["name"]))
                .relation("author_user", ExtractionSpec::new().attributes(["name"]))
                .rename("title", "headline"),
        )
        .relation("user", ExtractionSpec::new())
        .relation("mentions", ExtractionSpec::new().attributes(["title"]))
        .relation("categories", ExtractionSpec::new().attributes(["name"]))
}

#[test]
fn sqlite_matches_the_in_memory_source() {
    let conn = setup_db();
    let source = SqliteSource::new(&conn);
    let scope = Scope::all("Author").order_by(OrderBy::asc("id"));
    let spec = blog_spec();

    let from_sqlite = Extractor::new(&source, registry())
        .extract(&scope, &spec)
        .unwrap();
    let from_memory = Extractor::new(memory_source(), registry())
        .extract(&scope, &spec)
        .unwrap();

    assert_eq!(from_sqlite.len(), 3);
    assert_eq!(from_sqlite, from_memory);
}

#[test]
fn authors_with_their_posts() {
    let conn = setup_db();
    let source = SqliteSource::new(&conn);
    let spec = ExtractionSpec::new()
        .attributes(["name"])
        .relation("blog_posts", ExtractionSpec::new().attributes(["title"]));

    let authors = Extractor::new(&source, registry())
        .extract(&Scope::all("Author").filter(Condition::is_in("id", [2])), &spec)
        .unwrap();

    assert_eq!(
        authors,
        vec![record! {
            "id" => 2,
            "name" => "Bob",
            "blog_posts" => vec![Field::from(record! { "id" => 12, "title" => "Valves", "author_id" => 2 })],
        }]
    );
}

#[test]
fn fallback_coalesce_runs_in_sqlite() {
    let conn = setup_db();
    let source = SqliteSource::new(&conn);
    let posts = Extractor::new(&source, registry())
        .localizer(Fallbacks::new("es").fallback("es", ["en"]))
        .extract(
            &Scope::all("BlogPost").order_by(OrderBy::asc("id")),
            &ExtractionSpec::new().attributes(["text"]),
        )
        .unwrap();

    assert_eq!(
        values(&posts, "text"),
        [
            v("Texto de motores"),
            v("Gear text"),
            v("Texto de válvulas"),
            Value::Null,
        ]
    );
}

#[test]
fn single_locale_coalesce_is_valid_sql() {
    let conn = setup_db();
    let source = SqliteSource::new(&conn).uncached();
    let posts = Extractor::new(&source, registry())
        .extract(
            &Scope::all("BlogPost").order_by(OrderBy::desc("id")),
            &ExtractionSpec::new().attributes(["text"]),
        )
        .unwrap();
    assert_eq!(values(&posts, "id"), [v(13), v(12), v(11), v(10)]);
    assert_eq!(posts[3].value("text"), &v("Engine text"));
}

#[test]
fn statically_empty_scopes_never_reach_sqlite() {
    // No tables at all: any query would fail.
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let source = SqliteSource::new(&conn);
    let records = Extractor::new(&source, registry())
        .extract(
            &Scope::all("Author").filter(Condition::is_in("id", Vec::<i64>::new())),
            &ExtractionSpec::new(),
        )
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn sqlite_errors_are_passed_through() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let source = SqliteSource::new(&conn);
    let err = Extractor::new(&source, registry())
        .extract_all("Author", &ExtractionSpec::new())
        .unwrap_err();
    assert!(matches!(err, plucker::error::PluckError::Rusqlite(_)));
}

#[test]
fn rendered_sql_for_a_batched_fetch() {
    use plucker::core::scope::Filter;
    use plucker::core::source::{Projection, ProjectionQuery};

    let query = ProjectionQuery::new("references")
        .field(Projection::column("id"))
        .field(Projection::column("blog_post_id"))
        .filter(Filter::new().with(Condition::is_in("blog_post_id", [10, 12])));
    let rendered = render(&query);
    assert_eq!(
        rendered.sql,
        r#"SELECT "references"."id" AS "id", "references"."blog_post_id" AS "blog_post_id" FROM "references" WHERE "references"."blog_post_id" IN (?, ?)"#
    );
    assert_eq!(rendered.params, [v(10), v(12)]);
}
