//! Tracing utilities for extraction observability.
//!
//! Enable the `tracing` feature to emit spans and events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event for a projection query about to run.
///
/// ```ignore
/// plucker_trace_query!(query.table, query.fields.len(), query.joins.len());
/// ```
#[macro_export]
macro_rules! plucker_trace_query {
    ($table:expr, $fields:expr, $joins:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            table = %$table,
            fields = $fields,
            joins = $joins,
            "plucker.query"
        );
    };
}

/// Emit a debug-level tracing event with rendered SQL text and parameter count.
///
/// ```ignore
/// plucker_trace_sql!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! plucker_trace_sql {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "plucker.sql");
    };
}

/// Emit a trace-level event when a pipeline stage runs a phase.
///
/// ```ignore
/// plucker_trace_stage!("plan", stage.name(), entity.name);
/// ```
#[macro_export]
macro_rules! plucker_trace_stage {
    ($phase:literal, $stage:expr, $entity:expr) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(phase = $phase, stage = $stage, entity = %$entity, "plucker.stage");
    };
}
