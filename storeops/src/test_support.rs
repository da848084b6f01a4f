use crate::common::SubscriberRef;
use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::operation::{DeleteResult, PutResult, Resolver};
use crate::row;
use crate::store::memory::InMemoryStore;
use crate::store::{
    Changes, ChangesListener, DeleteQuery, InsertQuery, Row, Store, StoreProvider, UpdateQuery,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProviderCall {
    Begin,
    Successful,
    End,
    /// Sorted table names of the published change set.
    Notify(Vec<String>),
}

/// Provider that records every transaction and notification call before
/// forwarding it to an in-memory store.
#[derive(Clone, Default)]
pub(crate) struct RecordingProvider {
    store: InMemoryStore,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    notify_error: Arc<Mutex<Option<OpsError>>>,
}

impl RecordingProvider {
    pub(crate) fn new() -> Self {
        RecordingProvider::default()
    }

    pub(crate) fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self, call: &ProviderCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub(crate) fn notifications(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ProviderCall::Notify(tables) => Some(tables.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn fail_notifications(&self, error: OpsError) {
        *self.notify_error.lock() = Some(error);
    }

    pub(crate) fn seed(&self, table: &str, keys: &[&str]) {
        for key in keys {
            let query = InsertQuery::builder().table(table).key(key).build().unwrap();
            self.store.insert(&query, row! { "name" => key }).unwrap();
        }
    }
}

impl StoreProvider for RecordingProvider {
    fn begin_transaction(&self) -> OpsResult<()> {
        self.calls.lock().push(ProviderCall::Begin);
        self.store.begin_transaction()
    }

    fn set_transaction_successful(&self) -> OpsResult<()> {
        self.calls.lock().push(ProviderCall::Successful);
        self.store.set_transaction_successful()
    }

    fn end_transaction(&self) -> OpsResult<()> {
        self.calls.lock().push(ProviderCall::End);
        self.store.end_transaction()
    }

    fn in_transaction(&self) -> bool {
        self.store.in_transaction()
    }

    fn notify_about_changes(&self, changes: Changes) -> OpsResult<()> {
        let mut tables: Vec<String> = changes.affected_tables().iter().cloned().collect();
        tables.sort();
        self.calls.lock().push(ProviderCall::Notify(tables));
        if let Some(error) = self.notify_error.lock().clone() {
            return Err(error);
        }
        self.store.notify_about_changes(changes)
    }

    fn insert(&self, query: &InsertQuery, row: Row) -> OpsResult<String> {
        self.store.insert(query, row)
    }

    fn update(&self, query: &UpdateQuery, row: &Row) -> OpsResult<usize> {
        self.store.update(query, row)
    }

    fn delete(&self, query: &DeleteQuery) -> OpsResult<usize> {
        self.store.delete(query)
    }

    fn get(&self, table: &str, key: &str) -> OpsResult<Option<Row>> {
        self.store.get(table, key)
    }

    fn count(&self, table: &str) -> OpsResult<usize> {
        self.store.count(table)
    }

    fn subscribe(&self, listener: ChangesListener) -> OpsResult<Option<SubscriberRef>> {
        self.store.subscribe(listener)
    }

    fn unsubscribe(&self, subscriber: SubscriberRef) -> OpsResult<()> {
        self.store.unsubscribe(subscriber)
    }

    fn close(&self) -> OpsResult<()> {
        self.store.close()
    }

    fn is_closed(&self) -> bool {
        self.store.is_closed()
    }
}

pub(crate) fn recording_store() -> (Store, RecordingProvider) {
    let provider = RecordingProvider::new();
    let store = Store::new(provider.clone());
    (store, provider)
}

/// Delete resolver whose per-entity tables and failures are scripted up front.
///
/// Deletes the row keyed by the entity from every table it maps to. Entities
/// without a script touch the `items` table.
#[derive(Clone, Default)]
pub(crate) struct ScriptedResolver {
    tables: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    invocations: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    pub(crate) fn new() -> Self {
        ScriptedResolver::default()
    }

    pub(crate) fn touching(mut self, entity: &str, tables: &[&str]) -> Self {
        self.tables.insert(
            entity.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub(crate) fn failing_on(mut self, entity: &str) -> Self {
        self.failing.insert(entity.to_string());
        self
    }

    pub(crate) fn invocations(&self) -> Vec<String> {
        self.invocations.lock().clone()
    }

    fn tables_for(&self, entity: &str) -> Vec<String> {
        self.tables
            .get(entity)
            .cloned()
            .unwrap_or_else(|| vec!["items".to_string()])
    }
}

impl Resolver<String> for ScriptedResolver {
    type Outcome = DeleteResult;

    fn perform_operation(&self, store: &Store, entity: &String) -> OpsResult<DeleteResult> {
        self.invocations.lock().push(entity.clone());
        if self.failing.contains(entity) {
            return Err(OpsError::new(
                &format!("cannot delete {}", entity),
                ErrorKind::StoreOperationError,
            ));
        }

        let tables = self.tables_for(entity);
        let mut deleted = 0;
        for table in &tables {
            let query = DeleteQuery::builder().table(table).key(entity).build()?;
            deleted += store.internal().delete(&query)?;
        }
        Ok(DeleteResult::new_instance(deleted, tables))
    }
}

/// Put resolver that always inserts `entity` as the key of a new `items` row.
pub(crate) struct InsertingResolver;

impl Resolver<String> for InsertingResolver {
    type Outcome = PutResult;

    fn perform_operation(&self, store: &Store, entity: &String) -> OpsResult<PutResult> {
        let query = InsertQuery::builder().table("items").key(entity).build()?;
        let id = store.internal().insert(&query, row! { "name" => entity })?;
        Ok(PutResult::new_insert_result(&id, ["items"]))
    }
}

pub(crate) fn entities(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
