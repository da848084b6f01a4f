use crate::errors::OpsResult;
use crate::operation::{
    missing_resolver, Entity, PreparedPutObject, PreparedPutObjects, PutResolver, PutResult,
    Resolver,
};
use crate::store::Store;
use std::sync::Arc;

/// Entry point of a put (insert or update), returned by [`Store::put`].
pub struct PutBuilder {
    store: Store,
}

impl PutBuilder {
    pub(crate) fn new(store: Store) -> Self {
        PutBuilder { store }
    }

    pub fn objects<T: Entity>(self, objects: impl IntoIterator<Item = T>) -> PutObjectsBuilder<T> {
        PutObjectsBuilder {
            store: self.store,
            objects: objects.into_iter().collect(),
            use_transaction: true,
            resolver: None,
        }
    }

    pub fn object<T: Entity>(self, object: T) -> PutObjectBuilder<T> {
        PutObjectBuilder {
            store: self.store,
            object,
            resolver: None,
        }
    }
}

/// Configures a batch put. Same defaults as a batch delete.
pub struct PutObjectsBuilder<T> {
    store: Store,
    objects: Vec<T>,
    use_transaction: bool,
    resolver: Option<PutResolver<T>>,
}

impl<T: Entity> PutObjectsBuilder<T> {
    pub fn use_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    pub fn with_put_resolver(mut self, resolver: impl Resolver<T, Outcome = PutResult> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn prepare(self) -> OpsResult<PreparedPutObjects<T>> {
        let resolver = resolve::<T>(&self.store, self.resolver)?;
        Ok(PreparedPutObjects::new(
            self.store,
            self.objects,
            resolver,
            self.use_transaction,
        ))
    }
}

pub struct PutObjectBuilder<T> {
    store: Store,
    object: T,
    resolver: Option<PutResolver<T>>,
}

impl<T: Entity> PutObjectBuilder<T> {
    pub fn with_put_resolver(mut self, resolver: impl Resolver<T, Outcome = PutResult> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn prepare(self) -> OpsResult<PreparedPutObject<T>> {
        let resolver = resolve::<T>(&self.store, self.resolver)?;
        Ok(PreparedPutObject::new(self.store, self.object, resolver))
    }
}

fn resolve<T: Entity>(store: &Store, explicit: Option<PutResolver<T>>) -> OpsResult<PutResolver<T>> {
    match explicit {
        Some(resolver) => Ok(resolver),
        None => store
            .type_mapping::<T>()
            .and_then(|mapping| mapping.put_resolver())
            .ok_or_else(|| missing_resolver::<T>("put")),
    }
}
