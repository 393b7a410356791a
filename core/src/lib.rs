//! Batched extraction of relational rows into plain nested records.
//!
//! An [`Extractor`] takes a [`Scope`] (entity plus conditions) and an
//! [`ExtractionSpec`] (fields, relations, renames) and returns records in
//! the order the root query yields them. Each requested relation costs one
//! batched query per level (two for many-to-many), however many parent rows
//! there are.

pub mod error;
pub mod locale;
pub mod pipeline;
pub mod plan;
pub mod record;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod source;
pub mod spec;
pub mod stages;
pub mod value;

mod assemble;
#[doc(hidden)]
pub mod trace;

#[doc(hidden)]
pub mod profiling;

/// Field, relation, entity and locale names.
pub type Name = compact_str::CompactString;

/// Locale identifiers such as `en` or `pt-BR`.
pub type Locale = Name;

pub use assemble::Assembly;
pub use error::{ConfigurationError, EntityProblem, PluckError, Problem, Result};
pub use locale::{Fallbacks, Localizer};
pub use pipeline::{Env, Extract, Extractor, Pipeline, PipelineBuilder, Stage};
pub use plan::QueryPlan;
pub use record::{Field, Record, ResultSet};
pub use registry::{RelationRegistry, SchemaRegistry};
pub use schema::{EntitySchema, JoinTable, RelationBinding, RelationKind, Translations};
pub use scope::{Condition, Direction, Filter, OrderBy, Scope};
pub use source::{MemorySource, RecordingSource, RowSource, Table};
pub use spec::{ExtractionSpec, RelationSpec, ResultMode};
pub use value::Value;

/// Everything needed to describe and run an extraction.
pub mod prelude {
    pub use crate::error::{PluckError, Result};
    pub use crate::locale::{Fallbacks, Localizer};
    pub use crate::pipeline::{Extract, Extractor, Pipeline};
    pub use crate::record;
    pub use crate::record::{Field, Record};
    pub use crate::registry::{RelationRegistry, SchemaRegistry};
    pub use crate::schema::{EntitySchema, JoinTable, Translations};
    pub use crate::scope::{Condition, Filter, OrderBy, Scope};
    pub use crate::source::{MemorySource, RecordingSource, RowSource, Table};
    pub use crate::spec::ExtractionSpec;
    pub use crate::value::Value;
}
