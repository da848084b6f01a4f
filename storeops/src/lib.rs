#![allow(clippy::new_without_default)]
//! # storeops - transactional batch mutations for pluggable stores
//!
//! `storeops` runs a sequence of per-entity mutations (deletes and puts)
//! against a store, optionally inside one transaction, collects one result
//! per entity and publishes a single coalesced change notification naming
//! the affected tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use storeops::operation::{DefaultDeleteResolver, PreparedOperation};
//! use storeops::store::memory::InMemoryStore;
//! use storeops::store::{DeleteQuery, InsertQuery, Store, StoreProvider};
//! use storeops::row;
//!
//! # fn main() -> storeops::errors::OpsResult<()> {
//! let store = Store::new(InMemoryStore::new());
//! for id in ["1", "2", "3"] {
//!     let query = InsertQuery::builder().table("users").key(id).build()?;
//!     store.internal().insert(&query, row! { "name" => id })?;
//! }
//!
//! let resolver = DefaultDeleteResolver::new(|id: &String| {
//!     DeleteQuery::builder().table("users").key(id).build()
//! });
//!
//! let results = store
//!     .delete()
//!     .objects(vec!["1".to_string(), "3".to_string()])
//!     .with_delete_resolver(resolver)
//!     .prepare()?
//!     .execute_as_blocking()?;
//!
//! assert!(results.was_deleted(&"1".to_string()));
//! assert_eq!(store.internal().count("users")?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Execution semantics
//!
//! - With `use_transaction(true)` (the default) the batch runs inside one
//!   transaction. Listeners receive one notification with the union of
//!   affected tables, and only if every entity succeeded.
//! - With `use_transaction(false)` every entity is notified right after its
//!   own operation. A failure leaves earlier entities applied.
//! - The first resolver error stops the batch and is returned unchanged.
//!
//! ## Module Organization
//!
//! - [`common`] - Event bus wrapper, background executors and shared types
//! - [`errors`] - Error types and result definitions
//! - [`operation`] - Resolvers, the batch engine and the operation builders
//! - [`store`] - Store handle, provider contract, queries and the in-memory store

use crate::common::BackgroundExecutor;
use crate::common::IoExecutor;
use std::sync::{Arc, LazyLock};

pub mod common;
pub mod errors;
pub mod operation;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub(crate) static IO_EXECUTOR: LazyLock<Arc<dyn BackgroundExecutor>> =
    LazyLock::new(|| Arc::new(IoExecutor::new()));
