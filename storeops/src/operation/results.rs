use crate::operation::OperationOutcome;
use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

fn table_set<I, S>(tables: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tables.into_iter().map(Into::into).collect()
}

/// Outcome of deleting one entity.
///
/// Zero deleted rows is a valid result: the entity simply was not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteResult {
    number_of_rows_deleted: usize,
    affected_tables: HashSet<String>,
}

impl DeleteResult {
    pub fn new_instance<I, S>(number_of_rows_deleted: usize, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DeleteResult {
            number_of_rows_deleted,
            affected_tables: table_set(affected_tables),
        }
    }

    pub fn number_of_rows_deleted(&self) -> usize {
        self.number_of_rows_deleted
    }
}

impl OperationOutcome for DeleteResult {
    fn affected_tables(&self) -> &HashSet<String> {
        &self.affected_tables
    }
}

/// Outcome of putting one entity: either an insert or an update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PutResult {
    inserted_id: Option<String>,
    number_of_rows_updated: Option<usize>,
    affected_tables: HashSet<String>,
}

impl PutResult {
    pub fn new_insert_result<I, S>(inserted_id: &str, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PutResult {
            inserted_id: Some(inserted_id.to_string()),
            number_of_rows_updated: None,
            affected_tables: table_set(affected_tables),
        }
    }

    pub fn new_update_result<I, S>(number_of_rows_updated: usize, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PutResult {
            inserted_id: None,
            number_of_rows_updated: Some(number_of_rows_updated),
            affected_tables: table_set(affected_tables),
        }
    }

    pub fn inserted_id(&self) -> Option<&str> {
        self.inserted_id.as_deref()
    }

    pub fn number_of_rows_updated(&self) -> Option<usize> {
        self.number_of_rows_updated
    }

    pub fn was_inserted(&self) -> bool {
        self.inserted_id.is_some()
    }

    pub fn was_updated(&self) -> bool {
        self.number_of_rows_updated.is_some_and(|n| n > 0)
    }
}

impl OperationOutcome for PutResult {
    fn affected_tables(&self) -> &HashSet<String> {
        &self.affected_tables
    }
}

/// Ordered per-entity results of one batch execution.
///
/// One entry per distinct entity. Entries keep the order in which each
/// entity was first seen; if the batch contained the same entity twice, the
/// entry holds the outcome of its last occurrence.
#[derive(Debug, Clone)]
pub struct BatchResults<T, O> {
    results: IndexMap<T, O>,
}

/// Results of a batch delete.
pub type DeleteResults<T> = BatchResults<T, DeleteResult>;

/// Results of a batch put.
pub type PutResults<T> = BatchResults<T, PutResult>;

impl<T, O> BatchResults<T, O>
where
    T: Eq + Hash,
{
    pub(crate) fn new(results: IndexMap<T, O>) -> Self {
        BatchResults { results }
    }

    pub fn results(&self) -> &IndexMap<T, O> {
        &self.results
    }

    pub fn get(&self, entity: &T) -> Option<&O> {
        self.results.get(entity)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, T, O> {
        self.results.iter()
    }

    pub fn into_inner(self) -> IndexMap<T, O> {
        self.results
    }
}

impl<T: Eq + Hash> DeleteResults<T> {
    /// Returns true if deleting `entity` removed at least one row.
    pub fn was_deleted(&self, entity: &T) -> bool {
        self.get(entity).is_some_and(|r| r.number_of_rows_deleted() > 0)
    }

    pub fn was_not_deleted(&self, entity: &T) -> bool {
        !self.was_deleted(entity)
    }

    /// Total rows removed across the whole batch.
    pub fn number_of_rows_deleted(&self) -> usize {
        self.results.values().map(DeleteResult::number_of_rows_deleted).sum()
    }
}

impl<T: Eq + Hash> PutResults<T> {
    pub fn number_of_inserts(&self) -> usize {
        self.results.values().filter(|r| r.was_inserted()).count()
    }

    pub fn number_of_updates(&self) -> usize {
        self.results
            .values()
            .filter_map(PutResult::number_of_rows_updated)
            .sum()
    }
}

impl<T, O> IntoIterator for BatchResults<T, O> {
    type Item = (T, O);
    type IntoIter = indexmap::map::IntoIter<T, O>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
