use crate::errors::OpsResult;
use crate::operation::{DeleteResult, Resolver};
use crate::store::{DeleteQuery, Store};
use std::sync::Arc;

type MapToDeleteQuery<T> = Arc<dyn Fn(&T) -> OpsResult<DeleteQuery> + Send + Sync>;

/// Deletes an entity through the [`DeleteQuery`] it maps to.
///
/// The result reports the query's table as affected, even when no row
/// matched.
///
/// ```rust
/// use storeops::operation::DefaultDeleteResolver;
/// use storeops::store::DeleteQuery;
///
/// let resolver = DefaultDeleteResolver::new(|user_id: &u64| {
///     DeleteQuery::builder().table("users").key(&user_id.to_string()).build()
/// });
/// # let _ = resolver;
/// ```
pub struct DefaultDeleteResolver<T> {
    map_to_delete_query: MapToDeleteQuery<T>,
}

impl<T> Clone for DefaultDeleteResolver<T> {
    fn clone(&self) -> Self {
        DefaultDeleteResolver {
            map_to_delete_query: self.map_to_delete_query.clone(),
        }
    }
}

impl<T> DefaultDeleteResolver<T> {
    pub fn new(map_to_delete_query: impl Fn(&T) -> OpsResult<DeleteQuery> + Send + Sync + 'static) -> Self {
        DefaultDeleteResolver {
            map_to_delete_query: Arc::new(map_to_delete_query),
        }
    }
}

impl<T> Resolver<T> for DefaultDeleteResolver<T> {
    type Outcome = DeleteResult;

    fn perform_operation(&self, store: &Store, entity: &T) -> OpsResult<DeleteResult> {
        let query = (self.map_to_delete_query)(entity)?;
        let deleted = store.internal().delete(&query)?;
        Ok(DeleteResult::new_instance(deleted, [query.table()]))
    }
}
