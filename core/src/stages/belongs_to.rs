use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};
use crate::scope::Condition;

use super::common::{branch_scope, plan_source_fields, ParentIndex};

/// Fetches the owning record of every parent in one query.
#[derive(Debug, Clone, Copy, Default)]
pub struct BelongsTo;

impl Stage for BelongsTo {
    fn name(&self) -> &'static str {
        "belongs_to"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_source_fields(plan, RelationKind::BelongsTo);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let level = assembly.level;
        for requested in level.requested(RelationKind::BelongsTo) {
            let RelationBinding::BelongsTo {
                target,
                foreign_key,
                target_key,
            } = requested.binding
            else {
                continue;
            };
            let Some(spec) = requested.spec.nested() else {
                continue;
            };

            assembly.results.init_field(requested.name, || Field::NULL);
            let keys = assembly.results.distinct_values(foreign_key);
            if keys.is_empty() {
                continue;
            }

            let scope = branch_scope(
                target,
                [Condition::is_in(target_key.clone(), keys)],
                spec.scope.as_ref(),
            );
            let owners = level.env.extract(&scope, &spec.with_attribute(target_key))?;

            let owner_key = spec.output_name(target_key);
            let parents = ParentIndex::by_field(&assembly.results, foreign_key);
            for owner in owners {
                let key = owner.value(owner_key).clone();
                parents.set(&mut assembly.results, &key, requested.name, &Field::Record(owner));
            }
        }
        Ok(())
    }
}
