use indexmap::{IndexMap, IndexSet};

use crate::assemble::Assembly;
use crate::error::Result;
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};
use crate::scope::Condition;
use crate::Value;

use super::common::{branch_scope, plan_source_fields, ParentIndex};

/// Fetches polymorphic owners with one query per concrete type present.
///
/// Only types the spec has a branch for are fetched; parents pointing at
/// any other type keep a null owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct BelongsToPolymorphic;

impl Stage for BelongsToPolymorphic {
    fn name(&self) -> &'static str {
        "belongs_to_polymorphic"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_source_fields(plan, RelationKind::BelongsToPolymorphic);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let level = assembly.level;
        for requested in level.requested(RelationKind::BelongsToPolymorphic) {
            let RelationBinding::BelongsToPolymorphic {
                foreign_key,
                type_field,
                targets,
            } = requested.binding
            else {
                continue;
            };

            assembly.results.init_field(requested.name, || Field::NULL);

            let mut by_type: IndexMap<Value, IndexSet<Value>> = IndexMap::new();
            for record in assembly.results.records() {
                let (type_name, key) = (record.value(type_field), record.value(foreign_key));
                if type_name.is_key() && key.is_key() {
                    by_type
                        .entry(type_name.clone())
                        .or_default()
                        .insert(key.clone());
                }
            }

            for (type_value, keys) in by_type {
                let Some(type_name) = type_value.as_str() else {
                    continue;
                };
                let (Some(spec), Some(target)) =
                    (requested.spec.for_type(type_name), targets.get(type_name))
                else {
                    continue;
                };

                let scope = branch_scope(
                    &target.entity,
                    [Condition::is_in(target.key.clone(), keys)],
                    spec.scope.as_ref(),
                );
                let owners = level.env.extract(&scope, &spec.with_attribute(&target.key))?;

                let parents = ParentIndex::build(&assembly.results, foreign_key, |r| {
                    r.value(type_field) == &type_value
                });
                let owner_key = spec.output_name(&target.key);
                for owner in owners {
                    let key = owner.value(owner_key).clone();
                    parents.set(&mut assembly.results, &key, requested.name, &Field::Record(owner));
                }
            }
        }
        Ok(())
    }
}
