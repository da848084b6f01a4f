/// Topic every change listener is registered under on the change bus.
pub const CHANGES_EVENT: &str = "storeops_changes";

/// Name prefix of the background IO worker threads.
pub const IO_THREAD_PREFIX: &str = "storeops-io";

/// Column holding the generated key when a row is inserted without one.
pub const ROW_ID: &str = "_id";
