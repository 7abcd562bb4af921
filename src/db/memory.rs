use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, Cursor, DeleteOutcome, Filter, StoreError, TodoUpdate, UpdateOutcome};
use crate::models::{Todo, TodoId};

/// In-memory store. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    docs: Arc<RwLock<Vec<Todo>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn find(&self, filter: Filter) -> Result<Box<dyn Cursor>, StoreError> {
        let matches = self
            .docs
            .read()
            .await
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        Ok(Box::new(MemoryCursor {
            matches: Some(matches),
        }))
    }

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StoreError> {
        let id = TodoId::new();
        let mut doc = todo.clone();
        doc.id = Some(id);
        self.docs.write().await.push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: Filter,
        update: TodoUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.iter_mut().find(|d| filter.matches(d)) else {
            return Ok(UpdateOutcome::default());
        };

        let modified = doc.completed != update.completed || doc.updated_at != update.updated_at;
        doc.completed = update.completed;
        doc.updated_at = update.updated_at;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, filter: Filter) -> Result<DeleteOutcome, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(DeleteOutcome { deleted_count: 1 })
            }
            None => Ok(DeleteOutcome::default()),
        }
    }
}

/// Matches taken when the cursor was opened.
pub struct MemoryCursor {
    matches: Option<Vec<Todo>>,
}

#[async_trait]
impl Cursor for MemoryCursor {
    async fn all(&mut self, out: &mut Vec<Todo>) -> Result<(), StoreError> {
        let matches = self.matches.take().ok_or(StoreError::CursorClosed)?;
        out.extend(matches);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.matches = None;
        Ok(())
    }
}
