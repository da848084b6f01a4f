use crate::common::SubscriberRef;
use crate::errors::OpsResult;
use crate::store::{Changes, ChangesListener, DeleteQuery, InsertQuery, Row, UpdateQuery};

/// Low-level contract every storage backend implements.
///
/// # Purpose
/// The batch engine never talks to a backend directly; it drives a
/// `StoreProvider` through four calls: `begin_transaction`,
/// `set_transaction_successful`, `end_transaction` and
/// `notify_about_changes`. The remaining methods form the raw mutation
/// interface used by resolvers.
///
/// # Transactions
/// Transactions follow the begin / mark successful / end protocol:
/// - `begin_transaction` may nest; only the outermost transaction commits.
/// - `end_transaction` commits if the transaction was marked successful and
///   rolls back otherwise.
/// - `end_transaction` is called on every exit path, so it must be safe to
///   call after a failed operation.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. A provider is not required to be
/// reentrant across threads: callers that share one provider between
/// concurrent batches serialize access themselves.
pub trait StoreProvider: Send + Sync {
    /// Opens a (possibly nested) transaction.
    fn begin_transaction(&self) -> OpsResult<()>;

    /// Marks the innermost open transaction as successful.
    fn set_transaction_successful(&self) -> OpsResult<()>;

    /// Ends the innermost open transaction, committing or rolling back.
    fn end_transaction(&self) -> OpsResult<()>;

    /// Returns true while at least one transaction is open.
    fn in_transaction(&self) -> bool;

    /// Broadcasts a change set to the registered change listeners.
    fn notify_about_changes(&self, changes: Changes) -> OpsResult<()>;

    /// Inserts `row` and returns the key it was stored under.
    fn insert(&self, query: &InsertQuery, row: Row) -> OpsResult<String>;

    /// Overwrites columns of the selected rows; returns how many rows matched.
    fn update(&self, query: &UpdateQuery, row: &Row) -> OpsResult<usize>;

    /// Deletes the selected rows; returns how many rows were removed.
    fn delete(&self, query: &DeleteQuery) -> OpsResult<usize>;

    /// Reads one row by key.
    fn get(&self, table: &str, key: &str) -> OpsResult<Option<Row>>;

    /// Number of rows currently stored in `table`.
    fn count(&self, table: &str) -> OpsResult<usize>;

    /// Registers a change listener.
    fn subscribe(&self, listener: ChangesListener) -> OpsResult<Option<SubscriberRef>>;

    /// Removes a change listener.
    fn unsubscribe(&self, subscriber: SubscriberRef) -> OpsResult<()>;

    /// Closes the store. Further calls fail with `ErrorKind::StoreClosed`.
    fn close(&self) -> OpsResult<()>;

    fn is_closed(&self) -> bool;
}
