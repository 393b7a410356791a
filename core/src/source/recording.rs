use core::cell::RefCell;

use super::{ProjectionQuery, Row, RowSource};
use crate::error::Result;

/// Wraps a row source and keeps every query it was asked to run.
///
/// Used to check how many round trips an extraction costs.
#[derive(Debug, Default)]
pub struct RecordingSource<S> {
    inner: S,
    queries: RefCell<Vec<ProjectionQuery>>,
}

impl<S> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }

    pub fn queries(&self) -> Vec<ProjectionQuery> {
        self.queries.borrow().clone()
    }

    /// Tables queried, in order.
    pub fn tables(&self) -> Vec<String> {
        self.queries
            .borrow()
            .iter()
            .map(|q| q.table.to_string())
            .collect()
    }

    pub fn reset(&self) {
        self.queries.borrow_mut().clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RowSource> RowSource for RecordingSource<S> {
    fn project(&self, query: &ProjectionQuery) -> Result<Vec<Row>> {
        self.queries.borrow_mut().push(query.clone());
        self.inner.project(query)
    }
}
