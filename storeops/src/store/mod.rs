//! Store abstraction.
//!
//! A [`Store`] wraps a [`StoreProvider`], the backend contract the batch
//! engine drives, together with the [`TypeMapping`]s and the IO executor its
//! operations use. [`memory::InMemoryStore`] is the bundled provider.
//!
//! Backends broadcast [`Changes`] after each unit of work. Listeners register
//! through [`Store::observe_changes`] or [`Store::observe_changes_in_table`].

mod changes;
pub mod memory;
mod query;
mod store_handle;
mod store_provider;
mod type_mapping;

pub use changes::*;
pub use query::*;
pub use store_handle::*;
pub use store_provider::*;
pub use type_mapping::*;
