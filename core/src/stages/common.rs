use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::plan::QueryPlan;
use crate::record::{Field, Record, ResultSet};
use crate::schema::RelationKind;
use crate::scope::{Condition, Filter, Scope};
use crate::{Name, Value};

/// Positions of parent records by the value of one of their fields.
///
/// Parents whose field is null are left out; they never correlate.
pub(crate) struct ParentIndex {
    positions: HashMap<Value, SmallVec<[usize; 1]>>,
}

impl ParentIndex {
    pub(crate) fn by_field(results: &ResultSet, field: &str) -> Self {
        Self::build(results, field, |_| true)
    }

    pub(crate) fn build(results: &ResultSet, field: &str, keep: impl Fn(&Record) -> bool) -> Self {
        let mut positions: HashMap<Value, SmallVec<[usize; 1]>> = HashMap::new();
        for (idx, record) in results.records().enumerate() {
            let value = record.value(field);
            if value.is_key() && keep(record) {
                positions.entry(value.clone()).or_default().push(idx);
            }
        }
        Self { positions }
    }

    pub(crate) fn positions(&self, key: &Value) -> &[usize] {
        match self.positions.get(key) {
            Some(positions) => positions.as_slice(),
            None => &[],
        }
    }

    /// Sets `name` on every parent matching `key`.
    pub(crate) fn set(&self, results: &mut ResultSet, key: &Value, name: &str, field: &Field) {
        for &idx in self.positions(key) {
            if let Some(record) = results.get_index_mut(idx) {
                record.insert(name, field.clone());
            }
        }
    }

    /// Appends to the `name` list of every parent matching `key`.
    pub(crate) fn push(&self, results: &mut ResultSet, key: &Value, name: &str, field: &Field) {
        for &idx in self.positions(key) {
            push_at(results, idx, name, field.clone());
        }
    }
}

/// Appends to the `name` list of the record at `idx`.
pub(crate) fn push_at(results: &mut ResultSet, idx: usize, name: &str, field: Field) {
    if let Some(Field::List(items)) = results.get_index_mut(idx).and_then(|r| r.get_mut(name)) {
        items.push(field);
    }
}

/// Value a relation field starts with before anything is stitched in.
pub(crate) fn empty_default(kind: RelationKind) -> Field {
    if kind.is_many() {
        Field::List(Vec::new())
    } else {
        Field::NULL
    }
}

/// Scope of a batched related-row fetch.
pub(crate) fn branch_scope<I>(entity: &Name, conditions: I, extra: Option<&Filter>) -> Scope
where
    I: IntoIterator<Item = Condition>,
{
    let scope = conditions
        .into_iter()
        .fold(Scope::all(entity.clone()), Scope::filter);
    match extra {
        Some(filter) => scope.merge(filter),
        None => scope,
    }
}

/// Plans the parent-side fields of every requested relation of `kind`.
pub(crate) fn plan_source_fields(plan: &mut QueryPlan<'_>, kind: RelationKind) {
    for requested in plan.level.requested(kind) {
        for field in requested.binding.source_fields() {
            plan.project_column(field);
        }
    }
}
