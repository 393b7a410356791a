use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::{QueryPlan, Requested};
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};
use crate::scope::Condition;
use crate::spec::ExtractionSpec;

use super::common::{branch_scope, plan_source_fields, ParentIndex};

/// Fetches the owned records of every parent in one query, or only their
/// ids for `ids_only` branches.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasMany;

impl Stage for HasMany {
    fn name(&self) -> &'static str {
        "has_many"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_source_fields(plan, RelationKind::HasMany);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let level = assembly.level;
        for requested in level.requested(RelationKind::HasMany) {
            let Some(spec) = requested.spec.nested() else {
                continue;
            };
            if spec.is_ids_only() {
                resolve_ids(assembly, requested, spec)?;
            } else {
                resolve_records(assembly, requested, spec)?;
            }
        }
        Ok(())
    }
}

/// Conditions selecting the targets of `binding` for the parents in `assembly`.
pub(super) fn target_conditions(assembly: &Assembly<'_>, binding: &RelationBinding) -> Option<Vec<Condition>> {
    let (RelationBinding::HasMany {
        foreign_key,
        source_key,
        as_type,
        ..
    }
    | RelationBinding::HasOne {
        foreign_key,
        source_key,
        as_type,
        ..
    }) = binding
    else {
        return None;
    };

    let keys = assembly.results.distinct_values(source_key);
    if keys.is_empty() {
        return None;
    }
    let mut conditions = vec![Condition::is_in(foreign_key.clone(), keys)];
    if let Some(type_field) = as_type {
        conditions.push(Condition::eq(
            type_field.clone(),
            assembly.level.entity.name.as_str(),
        ));
    }
    Some(conditions)
}

fn resolve_records(assembly: &mut Assembly<'_>, requested: Requested<'_>, spec: &ExtractionSpec) -> Result<()> {
    let RelationBinding::HasMany {
        target,
        foreign_key,
        source_key,
        ..
    } = requested.binding
    else {
        return Ok(());
    };

    assembly
        .results
        .init_field(requested.name, || Field::List(Vec::new()));
    let Some(conditions) = target_conditions(assembly, requested.binding) else {
        return Ok(());
    };

    let scope = branch_scope(target, conditions, spec.scope.as_ref());
    let children = assembly
        .level
        .env
        .extract(&scope, &spec.with_attribute(foreign_key))?;

    let child_key = spec.output_name(foreign_key);
    let parents = ParentIndex::by_field(&assembly.results, source_key);
    for child in children {
        let key = child.value(child_key).clone();
        parents.push(&mut assembly.results, &key, requested.name, &Field::Record(child));
    }
    Ok(())
}

fn resolve_ids(assembly: &mut Assembly<'_>, requested: Requested<'_>, spec: &ExtractionSpec) -> Result<()> {
    let RelationBinding::HasMany {
        target,
        foreign_key,
        source_key,
        ids_field,
        ..
    } = requested.binding
    else {
        return Ok(());
    };

    assembly
        .results
        .init_field(ids_field, || Field::List(Vec::new()));
    let Some(conditions) = target_conditions(assembly, requested.binding) else {
        return Ok(());
    };

    let env = assembly.level.env;
    let target_key = &env.registry.require(target)?.primary_key;
    let scope = branch_scope(target, conditions, spec.scope.as_ref());
    let id_spec = ExtractionSpec::new().attributes([foreign_key.clone(), target_key.clone()]);
    let children = env.extract_default(&scope, &id_spec)?;

    let parents = ParentIndex::by_field(&assembly.results, source_key);
    for child in children {
        let id = Field::Value(child.value(target_key).clone());
        parents.push(&mut assembly.results, child.value(foreign_key), ids_field, &id);
    }
    Ok(())
}
