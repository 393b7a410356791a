//! Extraction specs: what to pull out of an entity and its relations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ConfigurationError, EntityProblem, Problem, Result};
use crate::pipeline::Extract;
use crate::registry::RelationRegistry;
use crate::schema::{EntitySchema, RelationBinding};
use crate::scope::Filter;
use crate::{Locale, Name};

/// Shape of a to-many relation's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Nested records under the relation name.
    #[default]
    Records,
    /// Only the `*_ids` list, no nested records.
    IdsOnly,
}

/// Recursive description of the fields and relations to extract.
///
/// ```
/// use plucker_core::ExtractionSpec;
///
/// let spec = ExtractionSpec::new()
///     .attributes(["name"])
///     .relation("blog_posts", ExtractionSpec::new().attributes(["title"]))
///     .rename("name", "author_name");
/// assert_eq!(spec.relations.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ExtractionSpec {
    /// `None` means every scalar field of the entity.
    pub attributes: Option<Vec<Name>>,
    /// Explicit per-locale attributes, output as `field_locale`.
    pub localized: IndexMap<Locale, Vec<Name>>,
    pub relations: IndexMap<Name, RelationSpec>,
    /// Applied last, pair by pair.
    pub renames: IndexMap<Name, Name>,
    /// Extra conditions and ordering for the rows this spec is applied to.
    pub scope: Option<Filter>,
    pub mode: ResultMode,
    /// Replaces the default pipeline for this branch.
    pub extractor: Option<Arc<dyn Extract>>,
}

impl ExtractionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes<I, N>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn localized<I, N>(mut self, locale: impl Into<Locale>, attributes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.localized
            .entry(locale.into())
            .or_default()
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn relation(mut self, name: impl Into<Name>, spec: impl Into<RelationSpec>) -> Self {
        self.relations.insert(name.into(), spec.into());
        self
    }

    /// Per-type specs for a polymorphic belongs-to. Types left out are not fetched.
    pub fn polymorphic<I, T>(self, name: impl Into<Name>, specs: I) -> Self
    where
        I: IntoIterator<Item = (T, ExtractionSpec)>,
        T: Into<Name>,
    {
        let specs = specs.into_iter().map(|(t, s)| (t.into(), s)).collect();
        self.relation(name, RelationSpec::Polymorphic(specs))
    }

    pub fn rename(mut self, from: impl Into<Name>, to: impl Into<Name>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn scope(mut self, filter: Filter) -> Self {
        self.scope = Some(filter);
        self
    }

    pub fn ids_only(mut self) -> Self {
        self.mode = ResultMode::IdsOnly;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extract>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn is_ids_only(&self) -> bool {
        self.mode == ResultMode::IdsOnly
    }

    /// Name `field` ends up under once this spec's renames have run.
    pub fn output_name<'a>(&'a self, field: &'a Name) -> &'a Name {
        self.renames.get(field).unwrap_or(field)
    }

    /// Adds `field` to an explicit attribute list; a spec asking for every
    /// field already has it.
    pub fn with_attribute(&self, field: &Name) -> Self {
        let mut spec = self.clone();
        if let Some(attributes) = spec.attributes.as_mut() {
            if !attributes.contains(field) {
                attributes.push(field.clone());
            }
        }
        spec
    }

    /// Checks this spec and every nested one against the registry.
    ///
    /// Problems from every level are collected into one error, each tagged
    /// with the entity it was found on.
    pub fn validate(&self, registry: &dyn RelationRegistry, entity: &str) -> Result<()> {
        let schema = registry.require(entity)?;
        let mut found = Vec::new();
        self.collect_problems(registry, schema, &mut found)?;
        if found.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError {
                entity: schema.name.clone(),
                found,
            }
            .into())
        }
    }

    fn collect_problems(
        &self,
        registry: &dyn RelationRegistry,
        schema: &EntitySchema,
        found: &mut Vec<EntityProblem>,
    ) -> Result<()> {
        found.extend(
            self.problems(registry, schema)?
                .into_iter()
                .map(|problem| EntityProblem {
                    entity: schema.name.clone(),
                    problem,
                }),
        );

        for (name, relation) in &self.relations {
            let Some(binding) = schema.relations.get(name) else {
                continue;
            };
            match relation {
                RelationSpec::Nested(spec) => {
                    if spec.is_ids_only() {
                        continue;
                    }
                    if let Some(target) = target_entity(registry, schema, binding)? {
                        spec.collect_problems(registry, registry.require(&target)?, found)?;
                    }
                }
                RelationSpec::Polymorphic(specs) => {
                    if let RelationBinding::BelongsToPolymorphic { targets, .. } = binding {
                        for (type_name, spec) in specs {
                            if let Some(target) = targets.get(type_name) {
                                spec.collect_problems(registry, registry.require(&target.entity)?, found)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks only this level's names against `schema`.
    pub fn validate_level(&self, registry: &dyn RelationRegistry, schema: &EntitySchema) -> Result<()> {
        let problems = self.problems(registry, schema)?;
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::new(schema.name.clone(), problems).into())
        }
    }

    fn problems(&self, registry: &dyn RelationRegistry, schema: &EntitySchema) -> Result<Vec<Problem>> {
        let mut problems = Vec::new();
        let translated = |field: &str| {
            schema
                .translations
                .as_ref()
                .is_some_and(|t| t.translates(field))
        };

        for attribute in self.attributes.iter().flatten() {
            if !schema.has_field(attribute) && !translated(attribute) {
                problems.push(Problem::UnknownAttribute(attribute.clone()));
            }
        }

        if !self.localized.is_empty() {
            if schema.translations.is_none() {
                problems.push(Problem::NotTranslatable);
            } else {
                for (locale, fields) in &self.localized {
                    for field in fields.iter().filter(|f| !translated(f)) {
                        problems.push(Problem::UnknownLocalizedAttribute {
                            locale: locale.clone(),
                            field: field.clone(),
                        });
                    }
                }
            }
        }

        for (name, relation) in &self.relations {
            let Some(binding) = schema.relations.get(name) else {
                problems.push(Problem::UnknownRelation(name.clone()));
                continue;
            };
            match (binding, relation) {
                (RelationBinding::BelongsToPolymorphic { targets, .. }, RelationSpec::Polymorphic(specs)) => {
                    for type_name in specs.keys().filter(|t| !targets.contains_key(*t)) {
                        problems.push(Problem::UnknownPolymorphicType {
                            relation: name.clone(),
                            type_name: type_name.clone(),
                        });
                    }
                }
                (RelationBinding::BelongsToPolymorphic { .. }, RelationSpec::Nested(_)) => {
                    problems.push(Problem::PolymorphicSpecExpected(name.clone()));
                }
                (_, RelationSpec::Polymorphic(_)) => {
                    problems.push(Problem::PlainSpecExpected(name.clone()));
                }
                (binding, RelationSpec::Nested(spec)) => {
                    if spec.is_ids_only() && binding.ids_field().is_none() {
                        problems.push(Problem::IdsOnlyUnsupported(name.clone()));
                    }
                    if let RelationBinding::HasManyThrough { through, source }
                    | RelationBinding::HasOneThrough { through, source } = binding
                    {
                        if let Some(missing) = broken_through(registry, schema, through, source)? {
                            problems.push(Problem::BrokenThrough {
                                relation: name.clone(),
                                missing,
                            });
                        }
                    }
                }
            }
        }

        Ok(problems)
    }
}

impl fmt::Debug for ExtractionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionSpec")
            .field("attributes", &self.attributes)
            .field("localized", &self.localized)
            .field("relations", &self.relations)
            .field("renames", &self.renames)
            .field("scope", &self.scope)
            .field("mode", &self.mode)
            .field("extractor", &self.extractor.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

/// What to extract for one relation.
#[derive(Debug, Clone)]
pub enum RelationSpec {
    Nested(ExtractionSpec),
    /// Keyed by concrete entity name.
    Polymorphic(IndexMap<Name, ExtractionSpec>),
}

impl RelationSpec {
    pub fn nested(&self) -> Option<&ExtractionSpec> {
        match self {
            RelationSpec::Nested(spec) => Some(spec),
            RelationSpec::Polymorphic(_) => None,
        }
    }

    pub fn for_type(&self, type_name: &str) -> Option<&ExtractionSpec> {
        match self {
            RelationSpec::Polymorphic(specs) => specs.get(type_name),
            RelationSpec::Nested(_) => None,
        }
    }
}

impl From<ExtractionSpec> for RelationSpec {
    fn from(spec: ExtractionSpec) -> Self {
        RelationSpec::Nested(spec)
    }
}

/// The entity a relation's nested spec is applied to, following through
/// relations to their source.
fn target_entity(
    registry: &dyn RelationRegistry,
    schema: &EntitySchema,
    binding: &RelationBinding,
) -> Result<Option<Name>> {
    match binding {
        RelationBinding::HasManyThrough { through, source }
        | RelationBinding::HasOneThrough { through, source } => {
            let Some(intermediate) = schema.relations.get(through).and_then(RelationBinding::target) else {
                return Ok(None);
            };
            let intermediate = registry.require(intermediate)?;
            match intermediate.relations.get(source) {
                Some(binding) => target_entity(registry, intermediate, binding),
                None => Ok(None),
            }
        }
        binding => Ok(binding.target().cloned()),
    }
}

/// Name of the missing piece when a through relation cannot be followed.
fn broken_through(
    registry: &dyn RelationRegistry,
    schema: &EntitySchema,
    through: &Name,
    source: &Name,
) -> Result<Option<Name>> {
    let binding = match schema.relations.get(through) {
        Some(binding) if binding.correlation().is_some() => binding,
        _ => return Ok(Some(through.clone())),
    };
    let Some(intermediate) = binding.target() else {
        return Ok(Some(through.clone()));
    };
    let intermediate = registry.require(intermediate)?;
    if intermediate.relations.contains_key(source) {
        Ok(None)
    } else {
        Ok(Some(source.clone()))
    }
}
