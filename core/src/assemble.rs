//! Turning raw tuples into records keyed by primary key.

use crate::error::{PluckError, Result};
use crate::plan::{Level, QueryPlan};
use crate::record::{Record, ResultSet};

/// The keyed records of one level, handed to each stage in turn.
pub struct Assembly<'a> {
    pub level: Level<'a>,
    pub results: ResultSet,
}

/// Runs the planned query and keys every tuple by its primary key.
///
/// A primary key seen twice keeps its first position and takes the later
/// tuple's values.
pub(crate) fn assemble<'a>(plan: QueryPlan<'a>) -> Result<Assembly<'a>> {
    crate::plucker_profile_function!();

    let level = plan.level;
    let query = plan.query();
    crate::plucker_trace_query!(query.table, query.fields.len(), query.joins.len());

    let rows = level.env.source.project(&query)?;
    let names: Vec<_> = query.names().cloned().collect();
    let primary_key = &level.entity.primary_key;

    let mut results = ResultSet::with_capacity(rows.len());
    for row in rows {
        if row.len() != names.len() {
            return Err(PluckError::Mapping(format!(
                "`{}` returned {} values for {} projected fields",
                query.table,
                row.len(),
                names.len()
            )));
        }
        let record: Record = names.iter().cloned().zip(row).collect();
        let key = record.value(primary_key).clone();
        if key.is_null() {
            return Err(PluckError::Mapping(format!(
                "`{}` returned a row without `{primary_key}`",
                query.table
            )));
        }
        results.insert(key, record);
    }

    Ok(Assembly { level, results })
}
