use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};

use super::common::{branch_scope, plan_source_fields, ParentIndex};
use super::has_many::target_conditions;

/// Fetches the single owned record of every parent in one query.
///
/// When several rows point at the same parent, the last one fetched wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasOne;

impl Stage for HasOne {
    fn name(&self) -> &'static str {
        "has_one"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_source_fields(plan, RelationKind::HasOne);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let level = assembly.level;
        for requested in level.requested(RelationKind::HasOne) {
            let RelationBinding::HasOne {
                target,
                foreign_key,
                source_key,
                ..
            } = requested.binding
            else {
                continue;
            };
            let Some(spec) = requested.spec.nested() else {
                continue;
            };

            assembly.results.init_field(requested.name, || Field::NULL);
            let Some(conditions) = target_conditions(assembly, requested.binding) else {
                continue;
            };

            let scope = branch_scope(target, conditions, spec.scope.as_ref());
            let children = level.env.extract(&scope, &spec.with_attribute(foreign_key))?;

            let child_key = spec.output_name(foreign_key);
            let parents = ParentIndex::by_field(&assembly.results, source_key);
            for child in children {
                let key = child.value(child_key).clone();
                parents.set(&mut assembly.results, &key, requested.name, &Field::Record(child));
            }
        }
        Ok(())
    }
}
