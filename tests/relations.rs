mod common;

use common::{extractor, ids, list_values, recording_extractor, values};
use plucker::error::{PluckError, Problem};
use plucker::prelude::*;

fn v(value: impl Into<Value>) -> Value {
    value.into()
}

fn names() -> ExtractionSpec {
    ExtractionSpec::new().attributes(["name"])
}

fn nested<'r>(record: &'r Record, field: &str) -> Option<&'r Record> {
    record.get(field).and_then(Field::as_record)
}

mod belongs_to {
    use super::*;

    #[test]
    fn owners_are_fetched_in_one_query() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .relation("author", names());

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(extractor.source().tables(), ["blog_posts", "authors"]);
        assert_eq!(
            nested(&posts[0], "author"),
            Some(&record! { "id" => 1, "name" => "Ann" })
        );
        assert_eq!(nested(&posts[1], "author").map(|a| a.value("name")), Some(&v("Ann")));
        assert_eq!(nested(&posts[2], "author").map(|a| a.value("name")), Some(&v("Bob")));
        // author 99 does not exist
        assert_eq!(posts[3].get("author"), Some(&Field::NULL));
    }

    #[test]
    fn null_foreign_keys_default_to_null() {
        let spec = ExtractionSpec::new().relation("editor", names());
        let posts = extractor().extract_all("BlogPost", &spec).unwrap();

        let editors: Vec<Option<&Value>> = posts
            .iter()
            .map(|p| nested(p, "editor").map(|e| e.value("name")))
            .collect();
        assert_eq!(editors, [Some(&v("editor")), None, Some(&v("editor")), None]);
        assert!(posts.iter().all(|p| p.contains("editor")));
    }

    #[test]
    fn foreign_key_is_fetched_even_when_not_requested() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new().attributes(["title"]).relation("author", names());
        extractor.extract_all("BlogPost", &spec).unwrap();

        let queries = extractor.source().queries();
        let fields: Vec<&str> = queries[0].names().map(|n| n.as_str()).collect();
        assert_eq!(fields, ["id", "title", "author_id"]);
    }

    #[test]
    fn renamed_owner_keys_still_match() {
        let spec = ExtractionSpec::new().relation("author", names().rename("id", "author_key"));
        let posts = extractor().extract_all("BlogPost", &spec).unwrap();
        assert_eq!(
            nested(&posts[0], "author"),
            Some(&record! { "author_key" => 1, "name" => "Ann" })
        );
    }
}

mod polymorphic {
    use super::*;

    #[test]
    fn unconfigured_types_stay_null() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .polymorphic("subject", [("Author", names())]);

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(values(&posts, "id"), [v(10), v(11), v(12), v(13)]);
        assert_eq!(
            nested(&posts[0], "subject"),
            Some(&record! { "id" => 1, "name" => "Ann" })
        );
        // Category subjects are not configured, so never fetched.
        assert_eq!(posts[1].get("subject"), Some(&Field::NULL));
        assert_eq!(posts[2].get("subject"), Some(&Field::NULL));
        assert_eq!(posts[3].get("subject"), Some(&Field::NULL));
        assert_eq!(extractor.source().tables(), ["blog_posts", "authors"]);
    }

    #[test]
    fn one_query_per_configured_type() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .polymorphic("subject", [("Author", names()), ("Category", names())]);

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(
            extractor.source().tables(),
            ["blog_posts", "authors", "categories"]
        );
        let subjects: Vec<Option<&Value>> = posts
            .iter()
            .map(|p| nested(p, "subject").map(|s| s.value("name")))
            .collect();
        assert_eq!(
            subjects,
            [Some(&v("Ann")), Some(&v("Mechanics")), None, Some(&v("History"))]
        );
    }

    #[test]
    fn type_specs_are_validated() {
        let spec = ExtractionSpec::new()
            .polymorphic("subject", [("Reference", ExtractionSpec::new())])
            .relation("author", ExtractionSpec::new())
            .relation("editor", plucker::core::RelationSpec::Polymorphic(Default::default()));
        let err = extractor().extract_all("BlogPost", &spec).unwrap_err();
        let PluckError::Configuration(config) = err else {
            panic!("expected a configuration error, got {err:?}");
        };
        assert_eq!(
            config.problems().cloned().collect::<Vec<_>>(),
            [
                Problem::UnknownPolymorphicType {
                    relation: "subject".into(),
                    type_name: "Reference".into(),
                },
                Problem::PlainSpecExpected("editor".into()),
            ]
        );
    }
}

mod has_many {
    use super::*;

    #[test]
    fn children_are_grouped_under_each_parent() {
        let extractor = recording_extractor();
        let spec = names().relation("blog_posts", ExtractionSpec::new().attributes(["title"]));

        let authors = extractor.extract_all("Author", &spec).unwrap();

        assert_eq!(extractor.source().query_count(), 2);
        let posts: Vec<Vec<Value>> = authors
            .iter()
            .map(|a| list_values(a.get("blog_posts").unwrap(), "title"))
            .collect();
        assert_eq!(
            posts,
            [vec![v("Engines"), v("Gears")], vec![v("Valves")], vec![]]
        );
        assert!(!authors[0].contains("blog_post_ids"));
    }

    #[test]
    fn renamed_foreign_keys_still_match() {
        let spec = names().relation(
            "blog_posts",
            ExtractionSpec::new()
                .attributes(["title"])
                .rename("author_id", "writer_id"),
        );
        let authors = extractor().extract_all("Author", &spec).unwrap();
        let posts = authors[0].get("blog_posts").unwrap();
        assert_eq!(list_values(posts, "title"), [v("Engines"), v("Gears")]);
        assert_eq!(list_values(posts, "writer_id"), [v(1), v(1)]);
    }

    #[test]
    fn ids_only_fills_the_id_list() {
        let extractor = recording_extractor();
        let spec = names().relation("blog_posts", ExtractionSpec::new().ids_only());

        let authors = extractor.extract_all("Author", &spec).unwrap();

        assert_eq!(extractor.source().query_count(), 2);
        assert!(!authors[0].contains("blog_posts"));
        let lists: Vec<Vec<Value>> = authors
            .iter()
            .map(|a| ids(a.get("blog_post_ids").unwrap()))
            .collect();
        assert_eq!(lists, [vec![v(10), v(11)], vec![v(12)], vec![]]);
    }

    #[test]
    fn inverse_polymorphic_filters_by_parent_type() {
        let extractor = recording_extractor();
        let spec = names().relation("mentions", ExtractionSpec::new().attributes(["title"]));

        let authors = extractor.extract_all("Author", &spec).unwrap();
        assert_eq!(list_values(authors[0].get("mentions").unwrap(), "id"), [v(10)]);
        assert_eq!(authors[1].get("mentions"), Some(&Field::List(Vec::new())));

        let queries = extractor.source().queries();
        assert!(queries[1]
            .filter
            .conditions
            .contains(&Condition::eq("subject_type", "Author")));

        let categories = extractor.extract_all("Category", &spec).unwrap();
        let mentions: Vec<Vec<Value>> = categories
            .iter()
            .map(|c| list_values(c.get("mentions").unwrap(), "id"))
            .collect();
        assert_eq!(mentions, [vec![v(11)], vec![v(13)], vec![]]);
    }

    #[test]
    fn ids_only_is_rejected_where_there_is_no_id_list() {
        let spec = ExtractionSpec::new().relation("author", ExtractionSpec::new().ids_only());
        let err = extractor().extract_all("BlogPost", &spec).unwrap_err();
        let PluckError::Configuration(config) = err else {
            panic!("expected a configuration error, got {err:?}");
        };
        assert_eq!(
            config.problems().cloned().collect::<Vec<_>>(),
            [Problem::IdsOnlyUnsupported("author".into())]
        );
    }
}

mod has_one {
    use super::*;

    #[test]
    fn single_child_or_null() {
        let extractor = recording_extractor();
        let spec = names().relation("user", names());

        let authors = extractor.extract_all("Author", &spec).unwrap();

        assert_eq!(extractor.source().query_count(), 2);
        assert_eq!(
            nested(&authors[0], "user"),
            Some(&record! { "id" => 1, "name" => "ann_user", "author_id" => 1 })
        );
        assert_eq!(authors[1].get("user"), Some(&Field::NULL));
        assert_eq!(authors[2].get("user"), Some(&Field::NULL));
    }

    #[test]
    fn last_matching_child_wins() {
        let spec = ExtractionSpec::new().relation(
            "first_reference",
            ExtractionSpec::new().attributes(["url"]),
        );
        let posts = extractor().extract_all("BlogPost", &spec).unwrap();
        let urls: Vec<Option<&Value>> = posts
            .iter()
            .map(|p| nested(p, "first_reference").map(|r| r.value("url")))
            .collect();
        assert_eq!(urls, [Some(&v("b.example")), None, Some(&v("c.example")), None]);
    }
}

mod through {
    use super::*;

    #[test]
    fn has_many_through_flattens_the_intermediate_lists() {
        let extractor = recording_extractor();
        let spec = names().relation("references", ExtractionSpec::new().attributes(["url"]));

        let authors = extractor.extract_all("Author", &spec).unwrap();

        assert_eq!(
            extractor.source().tables(),
            ["authors", "blog_posts", "references"]
        );
        let urls: Vec<Vec<Value>> = authors
            .iter()
            .map(|a| list_values(a.get("references").unwrap(), "url"))
            .collect();
        assert_eq!(
            urls,
            [vec![v("a.example"), v("b.example")], vec![v("c.example")], vec![]]
        );
        assert!(!authors[0].contains("blog_posts"));
    }

    #[test]
    fn has_many_through_a_many_to_many_keeps_every_path() {
        let spec = names().relation("categories", names());
        let authors = extractor().extract_all("Author", &spec).unwrap();

        let reached: Vec<Vec<Value>> = authors
            .iter()
            .map(|a| list_values(a.get("categories").unwrap(), "name"))
            .collect();
        assert_eq!(
            reached,
            [
                vec![v("Mechanics"), v("History"), v("Mechanics")],
                vec![v("History")],
                vec![],
            ]
        );
    }

    #[test]
    fn has_one_through_lifts_the_reached_record() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .relation("author_user", names());

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(extractor.source().tables(), ["blog_posts", "authors", "users"]);
        let users: Vec<Option<&Value>> = posts
            .iter()
            .map(|p| nested(p, "author_user").map(|u| u.value("name")))
            .collect();
        assert_eq!(
            users,
            [Some(&v("ann_user")), Some(&v("ann_user")), None, None]
        );
        assert!(posts.iter().all(|p| p.contains("author_user")));
    }
}

mod has_and_belongs_to_many {
    use super::*;

    #[test]
    fn ids_and_records_from_two_queries() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .relation("categories", names());

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(
            extractor.source().tables(),
            ["blog_posts", "blog_posts_categories", "categories"]
        );
        let id_lists: Vec<Vec<Value>> = posts
            .iter()
            .map(|p| ids(p.get("category_ids").unwrap()))
            .collect();
        assert_eq!(id_lists, [vec![v(1), v(2)], vec![v(1)], vec![v(2)], vec![]]);

        let named: Vec<Vec<Value>> = posts
            .iter()
            .map(|p| list_values(p.get("categories").unwrap(), "name"))
            .collect();
        assert_eq!(
            named,
            [
                vec![v("Mechanics"), v("History")],
                vec![v("Mechanics")],
                vec![v("History")],
                vec![],
            ]
        );
    }

    #[test]
    fn ids_only_leaves_out_the_records() {
        let extractor = recording_extractor();
        let spec = ExtractionSpec::new()
            .attributes(["title"])
            .relation("categories", ExtractionSpec::new().ids_only());

        let posts = extractor.extract_all("BlogPost", &spec).unwrap();

        assert_eq!(extractor.source().query_count(), 2);
        assert!(posts.iter().all(|p| !p.contains("categories")));
        assert_eq!(ids(posts[0].get("category_ids").unwrap()), [v(1), v(2)]);
        assert_eq!(ids(posts[3].get("category_ids").unwrap()), Vec::<Value>::new());
    }
}

#[test]
fn each_relation_costs_a_fixed_number_of_queries() {
    let extractor = recording_extractor();
    let spec = names()
        .relation(
            "blog_posts",
            ExtractionSpec::new()
                .attributes(["title"])
                .relation("categories", names())
                .relation("references", ExtractionSpec::new().attributes(["url"]))
                .relation("editor", names()),
        )
        .relation("user", names());

    let authors = extractor.extract_all("Author", &spec).unwrap();

    assert_eq!(authors.len(), 3);
    assert_eq!(
        extractor.source().tables(),
        [
            "authors",
            "blog_posts",
            "users",
            "references",
            "blog_posts_categories",
            "categories",
            "users",
        ]
    );
}
