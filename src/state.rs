use std::sync::Arc;

use crate::db::Collection;

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn Collection>,
}

impl AppState {
    pub fn new(todos: Arc<dyn Collection>) -> Self {
        Self { todos }
    }
}
