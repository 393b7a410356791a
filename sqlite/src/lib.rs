//! SQLite row source for plucker.
//!
//! [`render()`] turns a [`ProjectionQuery`](plucker_core::source::ProjectionQuery)
//! into SQL text with `?` parameters; with the `rusqlite` feature,
//! [`SqliteSource`] runs it on a `rusqlite::Connection`.

pub mod render;

#[cfg(feature = "rusqlite")]
mod source;

pub use render::{render, RenderedQuery};

#[cfg(feature = "rusqlite")]
pub use source::SqliteSource;
