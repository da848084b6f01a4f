use crate::errors::OpsResult;
use crate::operation::aggregator::ResultAggregator;
use crate::operation::transaction::TransactionCoordinator;
use crate::operation::{BatchResults, Entity, OperationOutcome, Resolver};
use crate::store::Store;
use std::sync::Arc;

/// One fully configured batch: the store, the entities, the resolver and
/// the transaction flag. Cheap to clone; the deferred mode clones it into
/// the background task.
pub(crate) struct BatchExecutor<T, O> {
    store: Store,
    objects: Arc<Vec<T>>,
    resolver: Arc<dyn Resolver<T, Outcome = O>>,
    use_transaction: bool,
}

impl<T, O> Clone for BatchExecutor<T, O> {
    fn clone(&self) -> Self {
        BatchExecutor {
            store: self.store.clone(),
            objects: self.objects.clone(),
            resolver: self.resolver.clone(),
            use_transaction: self.use_transaction,
        }
    }
}

impl<T: Entity, O: OperationOutcome> BatchExecutor<T, O> {
    pub(crate) fn new(
        store: Store,
        objects: Arc<Vec<T>>,
        resolver: Arc<dyn Resolver<T, Outcome = O>>,
        use_transaction: bool,
    ) -> Self {
        BatchExecutor {
            store,
            objects,
            resolver,
            use_transaction,
        }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    /// Runs the batch on the current thread.
    ///
    /// Stops at the first resolver error and returns it as is. Inside a
    /// transaction nothing is published and the transaction is rolled back;
    /// without one, entities processed before the failure stay applied and
    /// notified.
    pub(crate) fn execute(&self) -> OpsResult<BatchResults<T, O>> {
        log::debug!(
            "Executing batch of {} object(s), use transaction: {}",
            self.objects.len(),
            self.use_transaction
        );

        let provider = self.store.internal();
        let mut coordinator = TransactionCoordinator::begin(provider, self.use_transaction)?;
        let mut aggregator = ResultAggregator::with_capacity(self.objects.len());

        for object in self.objects.iter() {
            let outcome = self.resolver.perform_operation(&self.store, object)?;
            coordinator.after_operation(outcome.affected_tables())?;
            aggregator.record(object.clone(), outcome);
        }

        coordinator.commit(aggregator.affected_tables())?;
        coordinator.close()?;

        let results = aggregator.into_results();
        log::debug!("Batch finished with {} result(s)", results.len());
        Ok(results)
    }
}
