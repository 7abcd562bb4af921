//! Persistence capability used by the handlers.
//!
//! Handlers only see [`Collection`] and [`Cursor`]. The runtime backend is
//! [`sqlite::SqliteCollection`]; tests use [`memory::MemoryCollection`].

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Todo, TodoId};

pub use memory::MemoryCollection;
pub use sqlite::SqliteCollection;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No document matched. Handlers map this to 404.
    #[error("no documents in result")]
    NoDocuments,

    #[error("cursor is closed")]
    CursorClosed,

    #[error("failed to decode document: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NoDocuments,
            other => StoreError::Database(other),
        }
    }
}

/// Predicate on the `date` field. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatePredicate {
    Eq(String),
    Range { gte: String, lte: String },
}

impl DatePredicate {
    pub fn matches(&self, date: &str) -> bool {
        match self {
            DatePredicate::Eq(d) => date == d,
            DatePredicate::Range { gte, lte } => date >= gte.as_str() && date <= lte.as_str(),
        }
    }
}

/// Field predicates, all of which must hold. The default filter matches every todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub id: Option<TodoId>,
    pub date: Option<DatePredicate>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: TodoId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn on_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(DatePredicate::Eq(date.into())),
            ..Self::default()
        }
    }

    pub fn date_between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            date: Some(DatePredicate::Range {
                gte: start.into(),
                lte: end.into(),
            }),
            ..Self::default()
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(id) = &self.id {
            if todo.id.as_ref() != Some(id) {
                return false;
            }
        }
        if let Some(date) = &self.date {
            if !date.matches(&todo.date) {
                return false;
            }
        }
        true
    }
}

/// Fields written by [`Collection::update_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub completed: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

#[async_trait]
pub trait Collection: Send + Sync {
    /// Runs the query. Failures to reach the store surface here; the
    /// cursor only hands out and decodes what was matched.
    async fn find(&self, filter: Filter) -> Result<Box<dyn Cursor>, StoreError>;

    /// Persists `todo` under a freshly assigned id. Any id already set is ignored.
    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StoreError>;

    /// Applies `update` to at most one matching todo.
    async fn update_one(
        &self,
        filter: Filter,
        update: TodoUpdate,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Removes at most one matching todo.
    async fn delete_one(&self, filter: Filter) -> Result<DeleteOutcome, StoreError>;
}

#[async_trait]
pub trait Cursor: Send {
    /// Decodes every remaining match into `out`.
    async fn all(&mut self, out: &mut Vec<Todo>) -> Result<(), StoreError>;

    /// Releases the cursor. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(date: &str) -> Todo {
        Todo {
            id: Some(TodoId::new()),
            body: "body".to_string(),
            completed: false,
            date: date.to_string(),
            time: None,
            created_at: "2024-03-20T10:00:00Z".to_string(),
            updated_at: "2024-03-20T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_default_filter_matches_everything() {
        assert!(Filter::all().matches(&todo("2024-03-20")));
        assert!(Filter::all().matches(&Todo { id: None, ..todo("1999-01-01") }));
    }

    #[test]
    fn test_date_filters() {
        let t = todo("2024-03-20");
        assert!(Filter::on_date("2024-03-20").matches(&t));
        assert!(!Filter::on_date("2024-03-21").matches(&t));

        assert!(Filter::date_between("2024-03-20", "2024-03-21").matches(&t));
        assert!(Filter::date_between("2024-03-19", "2024-03-20").matches(&t));
        assert!(!Filter::date_between("2024-03-21", "2024-03-31").matches(&t));
        assert!(!Filter::date_between("2024-03-01", "2024-03-19").matches(&t));
    }

    #[test]
    fn test_id_filter() {
        let t = todo("2024-03-20");
        let id = t.id.unwrap();
        assert!(Filter::by_id(id).matches(&t));
        assert!(!Filter::by_id(TodoId::new()).matches(&t));
        assert!(!Filter::by_id(id).matches(&Todo { id: None, ..t }));
    }

    #[test]
    fn test_row_not_found_is_the_sentinel() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NoDocuments
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Database(_)
        ));
    }
}
