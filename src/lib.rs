//! # Plucker
//!
//! Batched extraction of relational rows into plain nested records.
//!
//! ## Quick Start
//!
//! ```rust
//! use plucker::prelude::*;
//!
//! # fn main() -> plucker::Result<()> {
//! let registry = SchemaRegistry::builder()
//!     .entity(
//!         EntitySchema::new("Author", "authors")
//!             .fields(["name"])
//!             .has_many("blog_posts", "BlogPost", "author_id"),
//!     )
//!     .entity(EntitySchema::new("BlogPost", "blog_posts").fields(["title", "author_id"]))
//!     .build();
//!
//! let source = MemorySource::new()
//!     .table(Table::new("authors", ["id", "name"]).row([Value::from(1), Value::from("Ada")]))
//!     .table(
//!         Table::new("blog_posts", ["id", "title", "author_id"])
//!             .row([Value::from(10), Value::from("Engines"), Value::from(1)]),
//!     );
//!
//! let spec = ExtractionSpec::new()
//!     .attributes(["name"])
//!     .relation("blog_posts", ExtractionSpec::new().attributes(["title"]));
//! let authors = Extractor::new(source, registry).extract_all("Author", &spec)?;
//!
//! assert_eq!(
//!     authors,
//!     vec![record! {
//!         "id" => 1,
//!         "name" => "Ada",
//!         "blog_posts" => vec![Field::from(record! {
//!             "id" => 10,
//!             "title" => "Engines",
//!             "author_id" => 1,
//!         })],
//!     }]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Row Sources
//!
//! | Source              | Feature Flag | Notes                              |
//! |---------------------|--------------|------------------------------------|
//! | `MemorySource`      | (always)     | in-process tables, used in tests   |
//! | `RecordingSource`   | (always)     | wraps another source, logs queries |
//! | `sqlite::SqliteSource` | `rusqlite` | renders SQL for a SQLite connection |

#![cfg_attr(docsrs, feature(doc_cfg))]

// =============================================================================
// Root-level exports
// =============================================================================

/// Result type for extraction operations
pub use plucker_core::error::Result;

/// Record construction macro
pub use plucker_core::record;

/// Error types
pub mod error {
    pub use plucker_core::error::{ConfigurationError, EntityProblem, PluckError, Problem};
}

/// The extraction engine: specs, schemas, stages and row sources.
pub use plucker_core as core;

// =============================================================================
// SQLite module
// =============================================================================

/// SQL rendering and the SQLite row source.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use plucker_sqlite::{render, RenderedQuery};

    #[cfg(feature = "rusqlite")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rusqlite")))]
    pub use plucker_sqlite::SqliteSource;
}

/// Everything needed to describe and run an extraction.
pub mod prelude {
    pub use plucker_core::prelude::*;

    #[cfg(feature = "rusqlite")]
    pub use crate::sqlite::SqliteSource;
}
