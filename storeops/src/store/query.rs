use crate::errors::{ErrorKind, OpsError, OpsResult};
use indexmap::IndexMap;

/// A stored row: ordered column name to value map.
pub type Row = IndexMap<String, String>;

/// Creates a [`Row`] from `column => value` pairs.
///
/// ```rust
/// use storeops::row;
///
/// let row = row! { "name" => "Alice", "email" => "alice@example.com" };
/// assert_eq!(row.get("name").map(String::as_str), Some("Alice"));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::store::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::store::Row::new();
        $( row.insert(($column).to_string(), ($value).to_string()); )+
        row
    }};
}

/// Which rows of a table a query targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every row of the table.
    #[default]
    All,
    /// The row stored under this key.
    Key(String),
    /// Rows whose column equals the value.
    ColumnEquals(String, String),
}

impl Selection {
    pub fn matches(&self, key: &str, row: &Row) -> bool {
        match self {
            Selection::All => true,
            Selection::Key(k) => k == key,
            Selection::ColumnEquals(column, value) => row.get(column) == Some(value),
        }
    }
}

fn require_table(table: Option<String>, query: &str) -> OpsResult<String> {
    match table {
        Some(table) if !table.trim().is_empty() => Ok(table),
        Some(_) => Err(OpsError::new(
            &format!("{} table name must not be empty", query),
            ErrorKind::ConfigurationError,
        )),
        None => Err(OpsError::new(
            &format!("Please specify a table for {}", query),
            ErrorKind::ConfigurationError,
        )),
    }
}

/// Deletes the selected rows of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    table: String,
    selection: Selection,
}

impl DeleteQuery {
    pub fn builder() -> DeleteQueryBuilder {
        DeleteQueryBuilder::default()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }
}

#[derive(Default)]
pub struct DeleteQueryBuilder {
    table: Option<String>,
    selection: Selection,
}

impl DeleteQueryBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.selection = Selection::Key(key.to_string());
        self
    }

    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.selection = Selection::ColumnEquals(column.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> OpsResult<DeleteQuery> {
        Ok(DeleteQuery {
            table: require_table(self.table, "DeleteQuery")?,
            selection: self.selection,
        })
    }
}

/// Inserts one row into a table, under an explicit or generated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertQuery {
    table: String,
    key: Option<String>,
}

impl InsertQuery {
    pub fn builder() -> InsertQueryBuilder {
        InsertQueryBuilder::default()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

#[derive(Default)]
pub struct InsertQueryBuilder {
    table: Option<String>,
    key: Option<String>,
}

impl InsertQueryBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn build(self) -> OpsResult<InsertQuery> {
        Ok(InsertQuery {
            table: require_table(self.table, "InsertQuery")?,
            key: self.key,
        })
    }
}

/// Overwrites columns of the selected rows of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuery {
    table: String,
    selection: Selection,
}

impl UpdateQuery {
    pub fn builder() -> UpdateQueryBuilder {
        UpdateQueryBuilder::default()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }
}

#[derive(Default)]
pub struct UpdateQueryBuilder {
    table: Option<String>,
    selection: Selection,
}

impl UpdateQueryBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.selection = Selection::Key(key.to_string());
        self
    }

    pub fn where_eq(mut self, column: &str, value: &str) -> Self {
        self.selection = Selection::ColumnEquals(column.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> OpsResult<UpdateQuery> {
        Ok(UpdateQuery {
            table: require_table(self.table, "UpdateQuery")?,
            selection: self.selection,
        })
    }
}
