use core::fmt;

use thiserror::Error;

use crate::Name;

#[derive(Debug, Error)]
pub enum PluckError {
    /// The extraction spec names things the entity does not have.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The registry has no entity with this name
    #[error("Unknown entity: {0}")]
    UnknownEntity(Name),

    /// The row source failed; passed through untouched
    #[error("Backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// A row did not match the projection it was produced for
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl PluckError {
    /// Wraps any row source failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Every problem found while validating a spec tree.
///
/// `entity` is the entity the root spec was applied to; each problem carries
/// the entity of the level it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid extraction spec for `{entity}`: {}", list(.entity, .found))]
pub struct ConfigurationError {
    pub entity: Name,
    pub found: Vec<EntityProblem>,
}

/// A problem and the entity whose spec level it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProblem {
    pub entity: Name,
    pub problem: Problem,
}

impl ConfigurationError {
    /// Problems found on `entity` itself.
    pub fn new(entity: impl Into<Name>, problems: Vec<Problem>) -> Self {
        let entity = entity.into();
        let found = problems
            .into_iter()
            .map(|problem| EntityProblem {
                entity: entity.clone(),
                problem,
            })
            .collect();
        Self { entity, found }
    }

    /// Every problem, depth first in spec order.
    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.found.iter().map(|p| &p.problem)
    }

    /// Problems found on spec levels applied to `entity`.
    pub fn problems_of<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a Problem> {
        self.found
            .iter()
            .filter(move |p| p.entity == entity)
            .map(|p| &p.problem)
    }

    /// Names of every unknown attribute, in the order they were requested.
    pub fn unknown_attributes(&self) -> impl Iterator<Item = &Name> {
        self.problems().filter_map(|p| match p {
            Problem::UnknownAttribute(name) => Some(name),
            _ => None,
        })
    }

    /// Names of every unknown relation, in the order they were requested.
    pub fn unknown_relations(&self) -> impl Iterator<Item = &Name> {
        self.problems().filter_map(|p| match p {
            Problem::UnknownRelation(name) => Some(name),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    UnknownAttribute(Name),
    UnknownRelation(Name),
    UnknownLocalizedAttribute { locale: Name, field: Name },
    /// Localized attributes were requested on an entity without translations.
    NotTranslatable,
    /// A polymorphic relation was given a plain nested spec.
    PolymorphicSpecExpected(Name),
    /// A non-polymorphic relation was given per-type specs.
    PlainSpecExpected(Name),
    UnknownPolymorphicType { relation: Name, type_name: Name },
    /// `ids_only` on a relation that has no id list.
    IdsOnlyUnsupported(Name),
    /// A through relation points at a relation that does not exist.
    BrokenThrough { relation: Name, missing: Name },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::UnknownAttribute(name) => write!(f, "unknown attribute `{name}`"),
            Problem::UnknownRelation(name) => write!(f, "unknown relation `{name}`"),
            Problem::UnknownLocalizedAttribute { locale, field } => {
                write!(f, "unknown translated attribute `{field}` for locale `{locale}`")
            }
            Problem::NotTranslatable => f.write_str("entity has no translations"),
            Problem::PolymorphicSpecExpected(name) => {
                write!(f, "relation `{name}` is polymorphic and needs one spec per type")
            }
            Problem::PlainSpecExpected(name) => {
                write!(f, "relation `{name}` is not polymorphic")
            }
            Problem::UnknownPolymorphicType {
                relation,
                type_name,
            } => write!(f, "relation `{relation}` cannot point at `{type_name}`"),
            Problem::IdsOnlyUnsupported(name) => {
                write!(f, "relation `{name}` does not support ids_only")
            }
            Problem::BrokenThrough { relation, missing } => {
                write!(f, "relation `{relation}` goes through missing relation `{missing}`")
            }
        }
    }
}

fn list(root: &Name, found: &[EntityProblem]) -> String {
    found
        .iter()
        .map(|p| {
            if &p.entity == root {
                p.problem.to_string()
            } else {
                format!("in `{}`: {}", p.entity, p.problem)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, PluckError>;
