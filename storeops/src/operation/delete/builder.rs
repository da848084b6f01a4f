use crate::errors::OpsResult;
use crate::operation::{
    missing_resolver, DeleteResolver, DeleteResult, Entity, PreparedDeleteObject,
    PreparedDeleteObjects, Resolver,
};
use crate::store::Store;
use std::sync::Arc;

/// Entry point of a delete, returned by [`Store::delete`].
pub struct DeleteBuilder {
    store: Store,
}

impl DeleteBuilder {
    pub(crate) fn new(store: Store) -> Self {
        DeleteBuilder { store }
    }

    /// Deletes a batch of entities.
    pub fn objects<T: Entity>(self, objects: impl IntoIterator<Item = T>) -> DeleteObjectsBuilder<T> {
        DeleteObjectsBuilder {
            store: self.store,
            objects: objects.into_iter().collect(),
            use_transaction: true,
            resolver: None,
        }
    }

    /// Deletes one entity.
    pub fn object<T: Entity>(self, object: T) -> DeleteObjectBuilder<T> {
        DeleteObjectBuilder {
            store: self.store,
            object,
            resolver: None,
        }
    }
}

/// Configures a batch delete.
///
/// Defaults: the batch runs in one transaction and the resolver comes from
/// the store's type mapping for `T`.
///
/// ```rust,ignore
/// let results = store
///     .delete()
///     .objects(users)
///     .use_transaction(false)
///     .prepare()?
///     .execute_as_blocking()?;
/// ```
pub struct DeleteObjectsBuilder<T> {
    store: Store,
    objects: Vec<T>,
    use_transaction: bool,
    resolver: Option<DeleteResolver<T>>,
}

impl<T: Entity> DeleteObjectsBuilder<T> {
    /// Whether to wrap the batch in a transaction. Defaults to `true`.
    pub fn use_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    /// Uses `resolver` instead of the one registered for `T`.
    pub fn with_delete_resolver(
        mut self,
        resolver: impl Resolver<T, Outcome = DeleteResult> + 'static,
    ) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fixes the configuration. Fails with `ConfigurationError` when no
    /// resolver was given and none is registered for `T`.
    pub fn prepare(self) -> OpsResult<PreparedDeleteObjects<T>> {
        let resolver = resolve::<T>(&self.store, self.resolver)?;
        Ok(PreparedDeleteObjects::new(
            self.store,
            self.objects,
            resolver,
            self.use_transaction,
        ))
    }
}

/// Configures the delete of a single entity.
pub struct DeleteObjectBuilder<T> {
    store: Store,
    object: T,
    resolver: Option<DeleteResolver<T>>,
}

impl<T: Entity> DeleteObjectBuilder<T> {
    pub fn with_delete_resolver(
        mut self,
        resolver: impl Resolver<T, Outcome = DeleteResult> + 'static,
    ) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn prepare(self) -> OpsResult<PreparedDeleteObject<T>> {
        let resolver = resolve::<T>(&self.store, self.resolver)?;
        Ok(PreparedDeleteObject::new(self.store, self.object, resolver))
    }
}

fn resolve<T: Entity>(
    store: &Store,
    explicit: Option<DeleteResolver<T>>,
) -> OpsResult<DeleteResolver<T>> {
    match explicit {
        Some(resolver) => Ok(resolver),
        None => store
            .type_mapping::<T>()
            .and_then(|mapping| mapping.delete_resolver())
            .ok_or_else(|| missing_resolver::<T>("delete")),
    }
}
