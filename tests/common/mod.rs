//! Blog fixtures shared by the integration tests.
//!
//! The same tables back both the in-memory source and, with the `rusqlite`
//! feature, an in-memory SQLite database.

#![allow(dead_code)]

use plucker::prelude::*;

#[cfg(feature = "rusqlite")]
mod sqlite;
#[cfg(feature = "rusqlite")]
pub use sqlite::*;

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::builder()
        .entity(
            EntitySchema::new("Author", "authors")
                .fields(["name", "email"])
                .has_many("blog_posts", "BlogPost", "author_id")
                .has_one("user", "User", "author_id")
                .has_many_as("mentions", "BlogPost", "subject")
                .has_many_through("categories", "blog_posts", "categories")
                .has_many_through("references", "blog_posts", "references"),
        )
        .entity(
            EntitySchema::new("User", "users")
                .fields(["name", "author_id"])
                .belongs_to("author", "Author", "author_id"),
        )
        .entity(
            EntitySchema::new("BlogPost", "blog_posts")
                .fields(["title", "author_id", "editor_id", "subject_id", "subject_type"])
                .translations(Translations::new("blog_post_translations", "blog_post_id").fields(["text"]))
                .belongs_to("author", "Author", "author_id")
                .belongs_to("editor", "User", "editor_id")
                .belongs_to_polymorphic("subject", ["Author", "Category"])
                .has_and_belongs_to_many(
                    "categories",
                    "Category",
                    JoinTable {
                        table: "blog_posts_categories".into(),
                        source_column: "blog_post_id".into(),
                        target_column: "category_id".into(),
                    },
                )
                .has_many("references", "Reference", "blog_post_id")
                .has_one("first_reference", "Reference", "blog_post_id")
                .has_one_through("author_user", "author", "user"),
        )
        .entity(
            EntitySchema::new("Category", "categories")
                .fields(["name"])
                .has_many_as("mentions", "BlogPost", "subject"),
        )
        .entity(
            EntitySchema::new("Reference", "references")
                .fields(["url", "blog_post_id"])
                .belongs_to("blog_post", "BlogPost", "blog_post_id"),
        )
        .build()
}

fn v(value: impl Into<Value>) -> Value {
    value.into()
}

const NULL: Value = Value::Null;

pub fn tables() -> Vec<Table> {
    vec![
        Table::new("authors", ["id", "name", "email"])
            .row([v(1), v("Ann"), v("ann@example.com")])
            .row([v(2), v("Bob"), v("bob@example.com")])
            .row([v(3), v("Cid"), NULL]),
        Table::new("users", ["id", "name", "author_id"])
            .row([v(1), v("ann_user"), v(1)])
            .row([v(2), v("editor"), NULL]),
        Table::new(
            "blog_posts",
            ["id", "title", "author_id", "editor_id", "subject_id", "subject_type"],
        )
        .row([v(10), v("Engines"), v(1), v(2), v(1), v("Author")])
        .row([v(11), v("Gears"), v(1), NULL, v(1), v("Category")])
        .row([v(12), v("Valves"), v(2), v(2), NULL, NULL])
        .row([v(13), v("Orphan"), v(99), NULL, v(2), v("Category")]),
        Table::new("blog_post_translations", ["id", "blog_post_id", "locale", "text"])
            .row([v(1), v(10), v("en"), v("Engine text")])
            .row([v(2), v(10), v("es"), v("Texto de motores")])
            .row([v(3), v(11), v("en"), v("Gear text")])
            .row([v(4), v(12), v("es"), v("Texto de válvulas")]),
        Table::new("categories", ["id", "name"])
            .row([v(1), v("Mechanics")])
            .row([v(2), v("History")])
            .row([v(3), v("Unused")]),
        Table::new("blog_posts_categories", ["blog_post_id", "category_id"])
            .row([v(10), v(1)])
            .row([v(10), v(2)])
            .row([v(11), v(1)])
            .row([v(12), v(2)])
            .row([v(12), v(2)]),
        Table::new("references", ["id", "url", "blog_post_id"])
            .row([v(1), v("a.example"), v(10)])
            .row([v(2), v("b.example"), v(10)])
            .row([v(3), v("c.example"), v(12)]),
    ]
}

pub fn memory_source() -> MemorySource {
    tables()
        .into_iter()
        .fold(MemorySource::new(), MemorySource::table)
}

/// An extractor over the fixtures whose source logs every query.
pub fn recording_extractor() -> Extractor<RecordingSource<MemorySource>, SchemaRegistry> {
    Extractor::new(RecordingSource::new(memory_source()), registry())
}

pub fn extractor() -> Extractor<MemorySource, SchemaRegistry> {
    Extractor::new(memory_source(), registry())
}

/// Values of `field` across `records`, in order.
pub fn values(records: &[Record], field: &str) -> Vec<Value> {
    records.iter().map(|r| r.value(field).clone()).collect()
}

/// Values of `field` on each record in a list field.
pub fn list_values(field: &Field, name: &str) -> Vec<Value> {
    field
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(Field::as_record)
        .map(|r| r.value(name).clone())
        .collect()
}

/// Plain values held by a list field, such as an id list.
pub fn ids(field: &Field) -> Vec<Value> {
    field
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(|f| f.as_value().cloned())
        .collect()
}
