use crate::common::{
    atomic, Atomic, NotificationBus, ReadExecutor, SubscriberRef, WriteExecutor, ROW_ID,
};
use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::store::{
    Changes, ChangesListener, DeleteQuery, InsertQuery, Row, Selection, StoreProvider, UpdateQuery,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type Table = IndexMap<String, Row>;
type Tables = HashMap<String, Table>;

/// In-memory [`StoreProvider`].
///
/// # Purpose
/// Keeps every table in process memory. Useful for tests, for caches that
/// need transactional batch semantics, and as the reference implementation
/// of the provider contract.
///
/// # Characteristics
/// - **Nested transactions**: `begin_transaction` nests; the outermost
///   `begin` snapshots all tables, the outermost `end` either keeps the
///   changes or restores the snapshot. A nested transaction that ends
///   without being marked successful dooms the outer one.
/// - **Generated keys**: inserts without a key get a monotonically
///   increasing numeric key, also stored in the `_id` column.
/// - **Change bus**: `notify_about_changes` fans out to the registered
///   [`ChangesListener`]s. Listener failures are logged and never fail the
///   mutation that triggered them.
///
/// The transaction state is store-wide, like a single database connection.
/// Concurrent batches against one store must be serialized by the caller.
///
/// # Usage
/// ```rust
/// use storeops::store::memory::InMemoryStore;
/// use storeops::store::{InsertQuery, StoreProvider};
/// use storeops::row;
///
/// let store = InMemoryStore::new();
/// let query = InsertQuery::builder().table("users").build().unwrap();
/// let key = store.insert(&query, row! { "name" => "Alice" }).unwrap();
/// assert!(store.get("users", &key).unwrap().is_some());
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }

    /// Names of all tables that hold at least one row, sorted.
    pub fn table_names(&self) -> OpsResult<Vec<String>> {
        self.inner.table_names()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreProvider for InMemoryStore {
    fn begin_transaction(&self) -> OpsResult<()> {
        self.inner.begin_transaction()
    }

    fn set_transaction_successful(&self) -> OpsResult<()> {
        self.inner.set_transaction_successful()
    }

    fn end_transaction(&self) -> OpsResult<()> {
        self.inner.end_transaction()
    }

    fn in_transaction(&self) -> bool {
        self.inner.in_transaction()
    }

    fn notify_about_changes(&self, changes: Changes) -> OpsResult<()> {
        self.inner.notify_about_changes(changes)
    }

    fn insert(&self, query: &InsertQuery, row: Row) -> OpsResult<String> {
        self.inner.insert(query, row)
    }

    fn update(&self, query: &UpdateQuery, row: &Row) -> OpsResult<usize> {
        self.inner.update(query, row)
    }

    fn delete(&self, query: &DeleteQuery) -> OpsResult<usize> {
        self.inner.delete(query)
    }

    fn get(&self, table: &str, key: &str) -> OpsResult<Option<Row>> {
        self.inner.get(table, key)
    }

    fn count(&self, table: &str) -> OpsResult<usize> {
        self.inner.count(table)
    }

    fn subscribe(&self, listener: ChangesListener) -> OpsResult<Option<SubscriberRef>> {
        self.inner.check_opened()?;
        self.inner.change_bus.register(listener)
    }

    fn unsubscribe(&self, subscriber: SubscriberRef) -> OpsResult<()> {
        self.inner.change_bus.deregister(subscriber)
    }

    fn close(&self) -> OpsResult<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

/// Open transaction levels, innermost last.
#[derive(Default)]
struct TransactionFrame {
    levels: Vec<bool>,
    doomed: bool,
    snapshot: Option<Tables>,
}

struct InMemoryStoreInner {
    tables: Atomic<Tables>,
    transaction: Mutex<TransactionFrame>,
    change_bus: NotificationBus<Changes, ChangesListener>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl InMemoryStoreInner {
    fn new() -> Self {
        InMemoryStoreInner {
            tables: atomic(HashMap::new()),
            transaction: Mutex::new(TransactionFrame::default()),
            change_bus: NotificationBus::new(),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    fn check_opened(&self) -> OpsResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(OpsError::new("Store is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }

    fn begin_transaction(&self) -> OpsResult<()> {
        self.check_opened()?;
        let mut frame = self.transaction.lock();
        if frame.levels.is_empty() {
            frame.snapshot = Some(self.tables.read_with(|tables| tables.clone()));
            frame.doomed = false;
        }
        frame.levels.push(false);
        log::debug!("Transaction begun, depth {}", frame.levels.len());
        Ok(())
    }

    fn set_transaction_successful(&self) -> OpsResult<()> {
        let mut frame = self.transaction.lock();
        match frame.levels.last_mut() {
            Some(successful) if *successful => Err(OpsError::new(
                "Transaction is already marked successful",
                ErrorKind::TransactionError,
            )),
            Some(successful) => {
                *successful = true;
                Ok(())
            }
            None => Err(OpsError::new(
                "Cannot mark transaction successful: no transaction is open",
                ErrorKind::TransactionError,
            )),
        }
    }

    fn end_transaction(&self) -> OpsResult<()> {
        let mut frame = self.transaction.lock();
        let successful = frame.levels.pop().ok_or_else(|| {
            OpsError::new(
                "Cannot end transaction: no transaction is open",
                ErrorKind::InvalidOperation,
            )
        })?;

        if !successful {
            frame.doomed = true;
        }

        if !frame.levels.is_empty() {
            log::debug!("Nested transaction ended, depth {}", frame.levels.len());
            return Ok(());
        }

        let snapshot = frame.snapshot.take();
        if frame.doomed {
            if let Some(snapshot) = snapshot {
                self.tables.write_with(|tables| *tables = snapshot);
            }
            log::debug!("Transaction rolled back");
        } else {
            log::debug!("Transaction committed");
        }
        frame.doomed = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.transaction.lock().levels.is_empty()
    }

    fn notify_about_changes(&self, changes: Changes) -> OpsResult<()> {
        self.check_opened()?;
        if let Err(e) = self.change_bus.publish(changes) {
            log::warn!("Change listener failed: {}", e);
        }
        Ok(())
    }

    fn insert(&self, query: &InsertQuery, mut row: Row) -> OpsResult<String> {
        self.check_opened()?;
        let mut tables = self.tables.write();
        let table = tables.entry(query.table().to_string()).or_default();

        let key = match query.key() {
            Some(key) => {
                if table.contains_key(key) {
                    return Err(OpsError::new(
                        &format!("Row with key '{}' already exists in '{}'", key, query.table()),
                        ErrorKind::ConstraintViolation,
                    ));
                }
                key.to_string()
            }
            None => loop {
                let candidate = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
                if !table.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        row.insert(ROW_ID.to_string(), key.clone());
        table.insert(key.clone(), row);
        Ok(key)
    }

    fn update(&self, query: &UpdateQuery, row: &Row) -> OpsResult<usize> {
        self.check_opened()?;
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(query.table()) else {
            return Ok(0);
        };

        let mut updated = 0;
        for (key, existing) in table.iter_mut() {
            if query.selection().matches(key, existing) {
                for (column, value) in row {
                    if column != ROW_ID {
                        existing.insert(column.clone(), value.clone());
                    }
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn delete(&self, query: &DeleteQuery) -> OpsResult<usize> {
        self.check_opened()?;
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(query.table()) else {
            return Ok(0);
        };

        let before = table.len();
        match query.selection() {
            Selection::Key(key) => {
                table.shift_remove(key);
            }
            selection => table.retain(|key, row| !selection.matches(key, row)),
        }
        Ok(before - table.len())
    }

    fn get(&self, table: &str, key: &str) -> OpsResult<Option<Row>> {
        self.check_opened()?;
        Ok(self
            .tables
            .read_with(|tables| tables.get(table).and_then(|t| t.get(key)).cloned()))
    }

    fn count(&self, table: &str) -> OpsResult<usize> {
        self.check_opened()?;
        Ok(self
            .tables
            .read_with(|tables| tables.get(table).map(|t| t.len()).unwrap_or(0)))
    }

    fn table_names(&self) -> OpsResult<Vec<String>> {
        self.check_opened()?;
        let mut names: Vec<String> = self.tables.read_with(|tables| {
            tables
                .iter()
                .filter(|(_, rows)| !rows.is_empty())
                .map(|(name, _)| name.clone())
                .collect()
        });
        names.sort();
        Ok(names)
    }

    fn close(&self) -> OpsResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let open_levels = self.transaction.lock().levels.len();
        if open_levels > 0 {
            log::warn!("Closing store with {} open transaction level(s)", open_levels);
        }
        self.change_bus.close()?;
        self.tables.write_with(|tables| tables.clear());
        Ok(())
    }
}
