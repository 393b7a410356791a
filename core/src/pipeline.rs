//! Extraction pipelines and the extractor entry point.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Every extraction level
//! runs `plan_query` on each stage in order, executes the single planned
//! query, then runs `assemble_results` on each stage in the same order.
//! Relation stages recurse into [`Env::extract`] for the related entity.

use std::sync::Arc;

use crate::assemble::{assemble, Assembly};
use crate::error::Result;
use crate::locale::{Fallbacks, Localizer};
use crate::plan::{Level, QueryPlan};
use crate::record::Record;
use crate::registry::RelationRegistry;
use crate::scope::Scope;
use crate::source::RowSource;
use crate::spec::ExtractionSpec;
use crate::stages;

/// One concern of an extraction level.
///
/// Both phases default to doing nothing.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adds projections and joins before the level's query runs.
    fn plan_query(&self, _plan: &mut QueryPlan<'_>) -> Result<()> {
        Ok(())
    }

    /// Adds, fills or moves output fields once the level's records exist.
    fn assemble_results(&self, _assembly: &mut Assembly<'_>) -> Result<()> {
        Ok(())
    }
}

/// Anything able to extract records for a scope and spec.
///
/// Implemented by [`Pipeline`]; set a custom one per branch through
/// [`ExtractionSpec::extractor`].
pub trait Extract: Send + Sync {
    fn extract(&self, env: &Env<'_>, scope: &Scope, spec: &ExtractionSpec) -> Result<Vec<Record>>;
}

/// The collaborators shared by every level of one extraction call.
#[derive(Clone, Copy)]
pub struct Env<'e> {
    pub source: &'e dyn RowSource,
    pub registry: &'e dyn RelationRegistry,
    pub localizer: &'e dyn Localizer,
    /// Used for branches without their own extractor.
    pub pipeline: &'e dyn Extract,
}

impl Env<'_> {
    /// Extracts a branch with its own extractor, or the default pipeline.
    pub fn extract(&self, scope: &Scope, spec: &ExtractionSpec) -> Result<Vec<Record>> {
        match spec.extractor.as_deref() {
            Some(extractor) => extractor.extract(self, scope, spec),
            None => self.pipeline.extract(self, scope, spec),
        }
    }

    /// Extracts with the default pipeline, ignoring any branch extractor.
    pub fn extract_default(&self, scope: &Scope, spec: &ExtractionSpec) -> Result<Vec<Record>> {
        self.pipeline.extract(self, scope, spec)
    }
}

/// Ordered stages run for every extraction level.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Starts from every built-in stage in their fixed order.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            stages: stages::standard(),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Extract for Pipeline {
    fn extract(&self, env: &Env<'_>, scope: &Scope, spec: &ExtractionSpec) -> Result<Vec<Record>> {
        crate::plucker_profile_function!();

        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let entity = env.registry.require(&scope.entity)?;
        let level = Level {
            env,
            entity,
            spec,
            scope,
        };

        let mut plan = QueryPlan::new(level)?;
        for stage in &self.stages {
            crate::plucker_trace_stage!("plan", stage.name(), entity.name);
            stage.plan_query(&mut plan)?;
        }

        let mut assembly = assemble(plan)?;
        if assembly.results.is_empty() {
            return Ok(Vec::new());
        }

        for stage in &self.stages {
            crate::plucker_trace_stage!("assemble", stage.name(), entity.name);
            stage.assemble_results(&mut assembly)?;
        }

        Ok(assembly.results.into_records())
    }
}

/// Selects the stages of a [`Pipeline`].
///
/// ```
/// use plucker_core::Pipeline;
///
/// let pipeline = Pipeline::builder().without("localized_attributes").build();
/// assert_eq!(pipeline.stage_names()[0], "attributes");
/// ```
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// An empty builder; the level's primary key is still fetched.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Drops the stage called `name`.
    pub fn without(mut self, name: &str) -> Self {
        self.stages.retain(|s| s.name() != name);
        self
    }

    /// Adds a stage ahead of the rename stage, so renames still run last.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        let at = self
            .stages
            .iter()
            .position(|s| s.name() == stages::Renames.name())
            .unwrap_or(self.stages.len());
        self.stages.insert(at, Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// Extraction entry point over a row source and a relation registry.
///
/// ```
/// use plucker_core::prelude::*;
///
/// let registry = SchemaRegistry::builder()
///     .entity(EntitySchema::new("Author", "authors").fields(["name"]))
///     .build();
/// let source = MemorySource::new().table(
///     Table::new("authors", ["id", "name"]).row([Value::from(1), Value::from("Ada")]),
/// );
///
/// let authors = Extractor::new(source, registry)
///     .extract(&Scope::all("Author"), &ExtractionSpec::new())
///     .unwrap();
/// assert_eq!(authors, vec![record! { "id" => 1, "name" => "Ada" }]);
/// ```
pub struct Extractor<S, R> {
    source: S,
    registry: R,
    localizer: Box<dyn Localizer>,
    pipeline: Arc<dyn Extract>,
}

impl<S: RowSource, R: RelationRegistry> Extractor<S, R> {
    pub fn new(source: S, registry: R) -> Self {
        Self {
            source,
            registry,
            localizer: Box::new(Fallbacks::default()),
            pipeline: Arc::new(Pipeline::default()),
        }
    }

    pub fn localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Box::new(localizer);
        self
    }

    /// Replaces the default pipeline used for every level.
    pub fn pipeline(mut self, pipeline: impl Extract + 'static) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Extracts `scope` as ordered records.
    ///
    /// A scope known to be empty returns nothing without validating `spec`.
    /// Otherwise the whole spec tree is validated before the first query.
    /// The spec's own scope narrows and orders the root rows after `scope`.
    pub fn extract(&self, scope: &Scope, spec: &ExtractionSpec) -> Result<Vec<Record>> {
        crate::plucker_profile_scope!("extract", scope.entity.as_str());

        if scope.is_empty() {
            return Ok(Vec::new());
        }
        spec.validate(&self.registry, &scope.entity)?;

        let merged;
        let scope = match &spec.scope {
            Some(filter) => {
                merged = scope.clone().merge(filter);
                &merged
            }
            None => scope,
        };

        let env = Env {
            source: &self.source,
            registry: &self.registry,
            localizer: self.localizer.as_ref(),
            pipeline: self.pipeline.as_ref(),
        };
        env.extract(scope, spec)
    }

    /// Extracts every row of `entity`.
    pub fn extract_all(&self, entity: &str, spec: &ExtractionSpec) -> Result<Vec<Record>> {
        self.extract(&Scope::all(entity), spec)
    }
}
