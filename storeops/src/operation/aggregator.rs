use crate::operation::{BatchResults, Entity, OperationOutcome};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Collects per-entity outcomes of a batch and the union of the tables they
/// touched.
///
/// The table union is grown on every `record` call, so it also covers outcomes
/// later replaced by a duplicate entity.
pub(crate) struct ResultAggregator<T, O> {
    results: IndexMap<T, O>,
    affected_tables: HashSet<String>,
}

impl<T: Entity, O: OperationOutcome> ResultAggregator<T, O> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ResultAggregator {
            results: IndexMap::with_capacity(capacity),
            affected_tables: HashSet::new(),
        }
    }

    pub(crate) fn record(&mut self, entity: T, outcome: O) {
        self.affected_tables
            .extend(outcome.affected_tables().iter().cloned());
        // insert keeps the original position of an existing key
        self.results.insert(entity, outcome);
    }

    pub(crate) fn affected_tables(&self) -> &HashSet<String> {
        &self.affected_tables
    }

    pub(crate) fn into_results(self) -> BatchResults<T, O> {
        BatchResults::new(self.results)
    }
}
