//! Projection planning: the fields and joins one extraction level fetches.

use indexmap::IndexMap;

use crate::error::Result;
use crate::pipeline::Env;
use crate::schema::{EntitySchema, RelationBinding, RelationKind};
use crate::scope::Scope;
use crate::source::{Join, Projection, ProjectionQuery, SourceExpr};
use crate::spec::{ExtractionSpec, RelationSpec};
use crate::Name;

/// What one extraction level works with, shared by planning and assembling.
#[derive(Clone, Copy)]
pub struct Level<'a> {
    pub env: &'a Env<'a>,
    pub entity: &'a EntitySchema,
    pub spec: &'a ExtractionSpec,
    pub scope: &'a Scope,
}

/// A relation of the current entity that the spec asks for.
#[derive(Clone, Copy)]
pub struct Requested<'a> {
    pub name: &'a Name,
    pub binding: &'a RelationBinding,
    pub spec: &'a RelationSpec,
}

impl<'a> Level<'a> {
    /// Requested relations of one kind, in spec order.
    pub fn requested(self, kind: RelationKind) -> impl Iterator<Item = Requested<'a>> + 'a {
        let entity = self.entity;
        self.spec.relations.iter().filter_map(move |(name, spec)| {
            let binding = entity.relations.get(name)?;
            (binding.kind() == kind).then_some(Requested {
                name,
                binding,
                spec,
            })
        })
    }
}

/// Accumulates the projection list and joins for one level.
///
/// Output names are unique: projecting a name twice keeps its first position
/// and the last expression.
pub struct QueryPlan<'a> {
    pub level: Level<'a>,
    /// Scalar attributes still to be projected by the attributes stage.
    pub attributes: Vec<Name>,
    projections: IndexMap<Name, SourceExpr>,
    joins: IndexMap<Name, Join>,
}

impl<'a> QueryPlan<'a> {
    /// Validates the level and plans its primary key.
    pub fn new(level: Level<'a>) -> Result<Self> {
        level
            .spec
            .validate_level(level.env.registry, level.entity)?;

        let attributes = match &level.spec.attributes {
            Some(attributes) => attributes.clone(),
            None => level.entity.fields.clone(),
        };
        let mut plan = Self {
            level,
            attributes,
            projections: IndexMap::new(),
            joins: IndexMap::new(),
        };
        plan.project_column(&level.entity.primary_key);
        Ok(plan)
    }

    pub fn project(&mut self, name: impl Into<Name>, expr: SourceExpr) {
        self.projections.insert(name.into(), expr);
    }

    /// Projects a base-table column under its own name.
    pub fn project_column(&mut self, column: &Name) {
        self.project(column.clone(), SourceExpr::column(column.clone()));
    }

    /// Adds a left outer join unless one with the same alias is planned.
    pub fn join(&mut self, join: Join) {
        self.joins.entry(join.alias.clone()).or_insert(join);
    }

    pub fn has_join(&self, alias: &str) -> bool {
        self.joins.contains_key(alias)
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.projections.keys()
    }

    /// The query to hand to the row source.
    pub fn query(&self) -> ProjectionQuery {
        let Level { entity, scope, .. } = self.level;
        let mut query = ProjectionQuery::new(entity.table.clone()).filter(scope.filter.clone());
        query.fields = self
            .projections
            .iter()
            .map(|(name, expr)| Projection::new(name.clone(), expr.clone()))
            .collect();
        query.joins = self.joins.values().cloned().collect();
        query
    }
}
