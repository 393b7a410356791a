//! Relations reached through another relation of the same entity.
//!
//! Both kinds extract the intermediate entity with a spec that asks only for
//! its correlation field plus the source relation, then lift the source
//! relation's output onto the parents.

use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};
use crate::scope::{Condition, Scope};
use crate::spec::ExtractionSpec;
use crate::Name;

use super::common::{empty_default, ParentIndex};

#[derive(Debug, Clone, Copy, Default)]
pub struct HasManyThrough;

#[derive(Debug, Clone, Copy, Default)]
pub struct HasOneThrough;

impl Stage for HasManyThrough {
    fn name(&self) -> &'static str {
        "has_many_through"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_through(plan, RelationKind::HasManyThrough);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        resolve(assembly, RelationKind::HasManyThrough)
    }
}

impl Stage for HasOneThrough {
    fn name(&self) -> &'static str {
        "has_one_through"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_through(plan, RelationKind::HasOneThrough);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        resolve(assembly, RelationKind::HasOneThrough)
    }
}

fn through_name(binding: &RelationBinding) -> Option<(&Name, &Name)> {
    match binding {
        RelationBinding::HasManyThrough { through, source }
        | RelationBinding::HasOneThrough { through, source } => Some((through, source)),
        _ => None,
    }
}

/// The parent-side field of each through relation's first hop.
fn plan_through(plan: &mut QueryPlan<'_>, kind: RelationKind) {
    let entity = plan.level.entity;
    for requested in plan.level.requested(kind) {
        let via = through_name(requested.binding).and_then(|(through, _)| entity.relations.get(through));
        if let Some((parent_field, _)) = via.and_then(RelationBinding::correlation) {
            plan.project_column(parent_field);
        }
    }
}

fn resolve(assembly: &mut Assembly<'_>, kind: RelationKind) -> Result<()> {
    let level = assembly.level;
    for requested in level.requested(kind) {
        let Some((through, source)) = through_name(requested.binding) else {
            continue;
        };
        let Some(spec) = requested.spec.nested() else {
            continue;
        };

        assembly
            .results
            .init_field(requested.name, || empty_default(kind));

        let Some(via) = level.entity.relations.get(through) else {
            continue;
        };
        let (Some((parent_field, middle_field)), Some(middle)) = (via.correlation(), via.target())
        else {
            continue;
        };

        let keys = assembly.results.distinct_values(parent_field);
        if keys.is_empty() {
            continue;
        }
        let mut scope = Scope::all(middle.clone()).filter(Condition::is_in(middle_field.clone(), keys));
        if let RelationBinding::HasMany {
            as_type: Some(type_field),
            ..
        }
        | RelationBinding::HasOne {
            as_type: Some(type_field),
            ..
        } = via
        {
            scope = scope.filter(Condition::eq(type_field.clone(), level.entity.name.as_str()));
        }

        let middle_spec = ExtractionSpec::new()
            .attributes([middle_field.clone()])
            .relation(source.clone(), spec.clone());
        let middles = level.env.extract_default(&scope, &middle_spec)?;

        let parents = ParentIndex::by_field(&assembly.results, parent_field);
        for row in middles {
            let key = row.value(middle_field);
            let Some(reached) = row.get(source) else {
                continue;
            };
            match (kind, reached) {
                (RelationKind::HasManyThrough, Field::List(items)) => {
                    for item in items {
                        parents.push(&mut assembly.results, key, requested.name, item);
                    }
                }
                (RelationKind::HasManyThrough, field) if !field.is_null() => {
                    parents.push(&mut assembly.results, key, requested.name, field);
                }
                (RelationKind::HasManyThrough, _) => {}
                (_, field) => parents.set(&mut assembly.results, key, requested.name, field),
            }
        }
    }
    Ok(())
}
