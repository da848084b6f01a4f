use crate::errors::OpsResult;
use crate::operation::{DeleteResult, PutResult};
use crate::store::Store;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bounds every batch entity has to satisfy.
///
/// Entities are map keys in the batch result, so their identity is whatever
/// their own `Eq + Hash` says. They are cloned into the result map and shared
/// with the background executor in deferred mode.
pub trait Entity: Eq + Hash + Clone + Send + Sync + 'static {}

impl<T> Entity for T where T: Eq + Hash + Clone + Send + Sync + 'static {}

/// Per-entity result of one mutation.
pub trait OperationOutcome: Send + Sync + 'static {
    /// Tables whose contents this single operation touched.
    fn affected_tables(&self) -> &HashSet<String>;
}

/// Strategy that performs one entity's mutation against a store.
///
/// Resolvers are stateless: the engine may share one resolver between
/// concurrent executions and calls it once per entity, strictly in order.
/// Returning `Err` aborts the whole batch; a no-op such as "nothing matched"
/// should be reported as a successful outcome instead.
pub trait Resolver<T>: Send + Sync {
    type Outcome: OperationOutcome;

    fn perform_operation(&self, store: &Store, entity: &T) -> OpsResult<Self::Outcome>;
}

/// Shared delete resolver, as stored in a type mapping.
pub type DeleteResolver<T> = Arc<dyn Resolver<T, Outcome = DeleteResult>>;

/// Shared put (insert or update) resolver, as stored in a type mapping.
pub type PutResolver<T> = Arc<dyn Resolver<T, Outcome = PutResult>>;

/// Resolver backed by a closure. Created with [`resolver_fn`].
pub struct FnResolver<F, O> {
    operation: F,
    _outcome: PhantomData<fn() -> O>,
}

/// Wraps a closure into a [`Resolver`].
///
/// ```rust
/// use storeops::operation::{resolver_fn, DeleteResult};
///
/// let resolver = resolver_fn(|_store, user: &String| {
///     Ok(DeleteResult::new_instance(0, ["users"]))
/// });
/// # let _ = resolver;
/// ```
pub fn resolver_fn<T, O, F>(operation: F) -> FnResolver<F, O>
where
    F: Fn(&Store, &T) -> OpsResult<O> + Send + Sync,
    O: OperationOutcome,
{
    FnResolver {
        operation,
        _outcome: PhantomData,
    }
}

impl<T, O, F> Resolver<T> for FnResolver<F, O>
where
    F: Fn(&Store, &T) -> OpsResult<O> + Send + Sync,
    O: OperationOutcome,
{
    type Outcome = O;

    fn perform_operation(&self, store: &Store, entity: &T) -> OpsResult<O> {
        (self.operation)(store, entity)
    }
}
