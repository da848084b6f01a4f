use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::operation::batch_executor::BatchExecutor;
#[cfg(feature = "deferred")]
use crate::operation::Deferred;
use crate::operation::{BatchResults, DeleteResult, Entity, OperationOutcome, PutResult, Resolver};
use crate::store::Store;
use std::sync::Arc;

/// A fully configured operation, ready to run any number of times.
///
/// Every execution is independent: results are created fresh and nothing is
/// kept between runs.
pub trait PreparedOperation {
    type Output: Send + 'static;

    /// Runs the operation on the calling thread.
    fn execute_as_blocking(&self) -> OpsResult<Self::Output>;

    /// The store the operation runs against.
    fn store(&self) -> &Store;

    /// Returns a cold [`Deferred`] running this operation on the store's IO
    /// executor once per subscription.
    #[cfg(feature = "deferred")]
    fn as_deferred(&self) -> Deferred<Self::Output>
    where
        Self: Clone + Send + Sync + Sized + 'static,
    {
        let operation = self.clone();
        Deferred::new(
            move || operation.execute_as_blocking(),
            self.store().io_executor(),
        )
    }
}

/// Prepared batch of entities sharing one resolver.
pub struct PreparedObjects<T, O> {
    executor: BatchExecutor<T, O>,
}

/// Prepared batch delete.
pub type PreparedDeleteObjects<T> = PreparedObjects<T, DeleteResult>;

/// Prepared batch put.
pub type PreparedPutObjects<T> = PreparedObjects<T, PutResult>;

impl<T, O> Clone for PreparedObjects<T, O> {
    fn clone(&self) -> Self {
        PreparedObjects {
            executor: self.executor.clone(),
        }
    }
}

impl<T: Entity, O: OperationOutcome> PreparedObjects<T, O> {
    pub(crate) fn new(
        store: Store,
        objects: Vec<T>,
        resolver: Arc<dyn Resolver<T, Outcome = O>>,
        use_transaction: bool,
    ) -> Self {
        PreparedObjects {
            executor: BatchExecutor::new(store, Arc::new(objects), resolver, use_transaction),
        }
    }
}

impl<T: Entity, O: OperationOutcome> PreparedOperation for PreparedObjects<T, O> {
    type Output = BatchResults<T, O>;

    fn execute_as_blocking(&self) -> OpsResult<BatchResults<T, O>> {
        self.executor.execute()
    }

    fn store(&self) -> &Store {
        self.executor.store()
    }
}

/// Prepared operation on a single entity. Runs without a transaction and
/// returns the bare outcome.
pub struct PreparedObject<T, O> {
    executor: BatchExecutor<T, O>,
}

/// Prepared single delete.
pub type PreparedDeleteObject<T> = PreparedObject<T, DeleteResult>;

/// Prepared single put.
pub type PreparedPutObject<T> = PreparedObject<T, PutResult>;

impl<T, O> Clone for PreparedObject<T, O> {
    fn clone(&self) -> Self {
        PreparedObject {
            executor: self.executor.clone(),
        }
    }
}

impl<T: Entity, O: OperationOutcome> PreparedObject<T, O> {
    pub(crate) fn new(store: Store, object: T, resolver: Arc<dyn Resolver<T, Outcome = O>>) -> Self {
        PreparedObject {
            executor: BatchExecutor::new(store, Arc::new(vec![object]), resolver, false),
        }
    }
}

impl<T: Entity, O: OperationOutcome> PreparedOperation for PreparedObject<T, O> {
    type Output = O;

    fn execute_as_blocking(&self) -> OpsResult<O> {
        self.executor
            .execute()?
            .into_iter()
            .next()
            .map(|(_, outcome)| outcome)
            .ok_or_else(|| {
                OpsError::new(
                    "Single object operation produced no result",
                    ErrorKind::InternalError,
                )
            })
    }

    fn store(&self) -> &Store {
        self.executor.store()
    }
}
