//! Built-in pipeline stages, one per concern.
//!
//! [`standard`] lists them in the order every level runs them: localized
//! attributes strip translated names before scalar attributes are planned,
//! id lists of many-to-many relations are filled before their records, and
//! renames come last.

mod attributes;
mod belongs_to;
mod common;
mod habtm;
mod has_many;
mod has_one;
mod localized;
mod polymorphic;
mod rename;
mod through;

pub use attributes::Attributes;
pub use belongs_to::BelongsTo;
pub use habtm::HasAndBelongsToMany;
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use localized::LocalizedAttributes;
pub use polymorphic::BelongsToPolymorphic;
pub use rename::Renames;
pub use through::{HasManyThrough, HasOneThrough};

use crate::pipeline::Stage;

/// Every built-in stage in its fixed order.
pub fn standard() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LocalizedAttributes),
        Box::new(Attributes),
        Box::new(BelongsTo),
        Box::new(BelongsToPolymorphic),
        Box::new(HasMany),
        Box::new(HasManyThrough),
        Box::new(HasAndBelongsToMany),
        Box::new(HasOne),
        Box::new(HasOneThrough),
        Box::new(Renames),
    ]
}
