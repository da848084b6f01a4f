use crate::errors::OpsResult;
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Immutable set of tables whose contents changed in one unit of work.
///
/// One `Changes` value is broadcast per unit of work: a whole transactional
/// batch, or a single operation when no transaction is used.
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Changes {
    affected_tables: HashSet<String>,
}

impl Changes {
    /// Creates a change set from any collection of table names.
    pub fn new_instance<I, S>(affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Changes {
            affected_tables: affected_tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn affected_tables(&self) -> &HashSet<String> {
        &self.affected_tables
    }

    pub fn is_empty(&self) -> bool {
        self.affected_tables.is_empty()
    }

    /// Returns true if any of `tables` is part of this change set.
    pub fn touches_any(&self, tables: &HashSet<String>) -> bool {
        !self.affected_tables.is_disjoint(tables)
    }
}

impl From<HashSet<String>> for Changes {
    fn from(affected_tables: HashSet<String>) -> Self {
        Changes { affected_tables }
    }
}

impl Debug for Changes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tables: Vec<&String> = self.affected_tables.iter().collect();
        tables.sort();
        f.debug_struct("Changes").field("affected_tables", &tables).finish()
    }
}

impl Display for Changes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tables: Vec<&str> = self.affected_tables.iter().map(String::as_str).collect();
        tables.sort_unstable();
        write!(f, "Changes{{{}}}", tables.join(", "))
    }
}

/// Closure signature accepted by [`ChangesListener`].
pub trait ChangesCallback: Send + Sync + Fn(Changes) -> OpsResult<()> {}

impl<F> ChangesCallback for F where F: Send + Sync + Fn(Changes) -> OpsResult<()> {}

/// Receives change notifications published by a store.
///
/// A listener created with [`ChangesListener::for_tables`] is only invoked
/// for change sets touching at least one of its tables.
///
/// ```ignore
/// provider.subscribe(ChangesListener::new(|changes| {
///     log::info!("tables changed: {}", changes);
///     Ok(())
/// }))?;
/// ```
#[derive(Clone)]
pub struct ChangesListener {
    on_changes: Arc<dyn ChangesCallback>,
    tables: Option<Arc<HashSet<String>>>,
}

impl ChangesListener {
    pub fn new(on_changes: impl ChangesCallback + 'static) -> Self {
        ChangesListener {
            on_changes: Arc::new(on_changes),
            tables: None,
        }
    }

    pub fn for_tables<I, S>(tables: I, on_changes: impl ChangesCallback + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChangesListener {
            on_changes: Arc::new(on_changes),
            tables: Some(Arc::new(tables.into_iter().map(Into::into).collect())),
        }
    }

    fn accepts(&self, changes: &Changes) -> bool {
        match &self.tables {
            Some(tables) => changes.touches_any(tables),
            None => true,
        }
    }
}

impl Handle<Changes> for ChangesListener {
    fn handle(&self, event: &Event<Changes>) -> Result<(), BasuError> {
        if !self.accepts(&event.data) {
            return Ok(());
        }
        (self.on_changes)(event.data.clone()).map_err(|e| BasuError::HandlerError(Error::from(e)))
    }
}

impl Debug for ChangesListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangesListener")
            .field("tables", &self.tables)
            .finish()
    }
}
