use crate::common::{io_executor, BackgroundExecutor, SubscriberRef};
use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::operation::{DeleteBuilder, Entity, PutBuilder};
use crate::store::{
    ChangesCallback, ChangesListener, StoreProvider, TypeMapping, TypeMappingRegistry,
};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Shared handle to a store: the provider plus the type mappings and the
/// IO executor operations run with.
///
/// Cloning is cheap; every clone refers to the same provider.
///
/// ```rust
/// use storeops::store::memory::InMemoryStore;
/// use storeops::store::Store;
///
/// let store = Store::builder()
///     .provider(InMemoryStore::new())
///     .build()
///     .unwrap();
/// assert!(!store.is_closed());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    provider: Arc<dyn StoreProvider>,
    type_mappings: TypeMappingRegistry,
    io_executor: Arc<dyn BackgroundExecutor>,
}

impl Store {
    /// Wraps `provider` with no type mappings and the shared IO executor.
    pub fn new<P: StoreProvider + 'static>(provider: P) -> Self {
        Store {
            inner: Arc::new(StoreInner {
                provider: Arc::new(provider),
                type_mappings: TypeMappingRegistry::default(),
                io_executor: io_executor(),
            }),
        }
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// The underlying provider, for resolvers and direct access.
    pub fn internal(&self) -> &dyn StoreProvider {
        self.inner.provider.as_ref()
    }

    pub fn type_mapping<T: Entity>(&self) -> Option<&TypeMapping<T>> {
        self.inner.type_mappings.get::<T>()
    }

    pub fn io_executor(&self) -> Arc<dyn BackgroundExecutor> {
        self.inner.io_executor.clone()
    }

    /// Starts configuring a delete.
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.clone())
    }

    /// Starts configuring a put.
    pub fn put(&self) -> PutBuilder {
        PutBuilder::new(self.clone())
    }

    /// Registers a listener for every change set.
    pub fn observe_changes(
        &self,
        on_changes: impl ChangesCallback + 'static,
    ) -> OpsResult<Option<SubscriberRef>> {
        self.inner.provider.subscribe(ChangesListener::new(on_changes))
    }

    /// Registers a listener for change sets touching `table`.
    pub fn observe_changes_in_table(
        &self,
        table: &str,
        on_changes: impl ChangesCallback + 'static,
    ) -> OpsResult<Option<SubscriberRef>> {
        self.inner
            .provider
            .subscribe(ChangesListener::for_tables([table], on_changes))
    }

    pub fn stop_observing(&self, subscriber: SubscriberRef) -> OpsResult<()> {
        self.inner.provider.unsubscribe(subscriber)
    }

    pub fn close(&self) -> OpsResult<()> {
        self.inner.provider.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.provider.is_closed()
    }
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("type_mappings", &self.inner.type_mappings.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builds a [`Store`]. The first configuration error is kept and returned
/// by [`build`](StoreBuilder::build).
#[derive(Default)]
pub struct StoreBuilder {
    error: Option<OpsError>,
    provider: Option<Arc<dyn StoreProvider>>,
    type_mappings: TypeMappingRegistry,
    io_executor: Option<Arc<dyn BackgroundExecutor>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder::default()
    }

    pub fn provider<P: StoreProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Registers default resolvers for `T`. Registering `T` twice is an error.
    pub fn add_type_mapping<T: Entity>(mut self, mapping: TypeMapping<T>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.type_mappings.register(mapping) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Runs deferred operations on `executor` instead of the shared one.
    pub fn io_executor(mut self, executor: Arc<dyn BackgroundExecutor>) -> Self {
        self.io_executor = Some(executor);
        self
    }

    pub fn build(self) -> OpsResult<Store> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let provider = self.provider.ok_or_else(|| {
            OpsError::new(
                "Please specify a store provider",
                ErrorKind::ConfigurationError,
            )
        })?;

        Ok(Store {
            inner: Arc::new(StoreInner {
                provider,
                type_mappings: self.type_mappings,
                io_executor: self.io_executor.unwrap_or_else(io_executor),
            }),
        })
    }
}
