use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::assemble::Assembly;
use crate::error::{PluckError, Result};
use crate::pipeline::Stage;
use crate::plan::QueryPlan;
use crate::record::Field;
use crate::schema::{RelationBinding, RelationKind};
use crate::scope::{Condition, Filter};
use crate::source::{Projection, ProjectionQuery};
use crate::Value;

use super::common::{branch_scope, plan_source_fields, push_at, ParentIndex};

/// Many-to-many relations through a join table.
///
/// The join table is always read first to fill the `*_ids` list; unless the
/// branch is `ids_only`, the related records are then fetched for the union
/// of those ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasAndBelongsToMany;

impl Stage for HasAndBelongsToMany {
    fn name(&self) -> &'static str {
        "has_and_belongs_to_many"
    }

    fn plan_query(&self, plan: &mut QueryPlan<'_>) -> Result<()> {
        plan_source_fields(plan, RelationKind::HasAndBelongsToMany);
        Ok(())
    }

    fn assemble_results(&self, assembly: &mut Assembly<'_>) -> Result<()> {
        let level = assembly.level;
        for requested in level.requested(RelationKind::HasAndBelongsToMany) {
            let RelationBinding::HasAndBelongsToMany {
                target,
                join_table,
                source_key,
                target_key,
                ids_field,
            } = requested.binding
            else {
                continue;
            };
            let Some(spec) = requested.spec.nested() else {
                continue;
            };

            assembly
                .results
                .init_field(ids_field, || Field::List(Vec::new()));
            if !spec.is_ids_only() {
                assembly
                    .results
                    .init_field(requested.name, || Field::List(Vec::new()));
            }

            let keys = assembly.results.distinct_values(source_key);
            if keys.is_empty() {
                continue;
            }

            let query = ProjectionQuery::new(join_table.table.clone())
                .field(Projection::column(join_table.source_column.clone()))
                .field(Projection::column(join_table.target_column.clone()))
                .filter(Filter::new().with(Condition::is_in(join_table.source_column.clone(), keys)));
            crate::plucker_trace_query!(query.table, query.fields.len(), query.joins.len());
            let links = level.env.source.project(&query)?;

            // Parent positions per linked id, each parent listed once.
            let parents = ParentIndex::by_field(&assembly.results, source_key);
            let mut owners: IndexMap<Value, SmallVec<[usize; 2]>> = IndexMap::new();
            for link in links {
                let [source, linked] = <[Value; 2]>::try_from(link).map_err(|row| {
                    PluckError::Mapping(format!(
                        "`{}` returned {} values for 2 projected fields",
                        join_table.table,
                        row.len()
                    ))
                })?;
                if linked.is_null() {
                    continue;
                }
                let owned = owners.entry(linked.clone()).or_default();
                for &idx in parents.positions(&source) {
                    if !owned.contains(&idx) {
                        owned.push(idx);
                        push_at(&mut assembly.results, idx, ids_field, Field::Value(linked.clone()));
                    }
                }
            }

            if spec.is_ids_only() || owners.is_empty() {
                continue;
            }

            let ids: Vec<Value> = owners.keys().cloned().collect();
            let scope = branch_scope(
                target,
                [Condition::is_in(target_key.clone(), ids)],
                spec.scope.as_ref(),
            );
            let related = level.env.extract(&scope, &spec.with_attribute(target_key))?;

            let related_key = spec.output_name(target_key);
            for record in related {
                let Some(positions) = owners.get(record.value(related_key)) else {
                    continue;
                };
                let field = Field::Record(record);
                for &idx in positions {
                    push_at(&mut assembly.results, idx, requested.name, field.clone());
                }
            }
        }
        Ok(())
    }
}
