use crate::errors::OpsResult;
use crate::operation::{PutResult, Resolver};
use crate::store::{InsertQuery, Row, Store, UpdateQuery};
use std::sync::Arc;

type MapToInsertQuery<T> = Arc<dyn Fn(&T) -> OpsResult<InsertQuery> + Send + Sync>;
type MapToUpdateQuery<T> = Arc<dyn Fn(&T) -> OpsResult<UpdateQuery> + Send + Sync>;
type MapToRow<T> = Arc<dyn Fn(&T) -> OpsResult<Row> + Send + Sync>;

/// Upserts an entity: updates the rows its [`UpdateQuery`] selects and
/// inserts through its [`InsertQuery`] when nothing was updated.
pub struct DefaultPutResolver<T> {
    map_to_insert_query: MapToInsertQuery<T>,
    map_to_update_query: MapToUpdateQuery<T>,
    map_to_row: MapToRow<T>,
}

impl<T> Clone for DefaultPutResolver<T> {
    fn clone(&self) -> Self {
        DefaultPutResolver {
            map_to_insert_query: self.map_to_insert_query.clone(),
            map_to_update_query: self.map_to_update_query.clone(),
            map_to_row: self.map_to_row.clone(),
        }
    }
}

impl<T> DefaultPutResolver<T> {
    pub fn new(
        map_to_insert_query: impl Fn(&T) -> OpsResult<InsertQuery> + Send + Sync + 'static,
        map_to_update_query: impl Fn(&T) -> OpsResult<UpdateQuery> + Send + Sync + 'static,
        map_to_row: impl Fn(&T) -> OpsResult<Row> + Send + Sync + 'static,
    ) -> Self {
        DefaultPutResolver {
            map_to_insert_query: Arc::new(map_to_insert_query),
            map_to_update_query: Arc::new(map_to_update_query),
            map_to_row: Arc::new(map_to_row),
        }
    }
}

impl<T> Resolver<T> for DefaultPutResolver<T> {
    type Outcome = PutResult;

    fn perform_operation(&self, store: &Store, entity: &T) -> OpsResult<PutResult> {
        let row = (self.map_to_row)(entity)?;
        let update_query = (self.map_to_update_query)(entity)?;

        let updated = store.internal().update(&update_query, &row)?;
        if updated > 0 {
            return Ok(PutResult::new_update_result(updated, [update_query.table()]));
        }

        let insert_query = (self.map_to_insert_query)(entity)?;
        let inserted_id = store.internal().insert(&insert_query, row)?;
        Ok(PutResult::new_insert_result(&inserted_id, [insert_query.table()]))
    }
}
