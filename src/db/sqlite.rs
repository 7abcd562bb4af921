use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::{
    Collection, Cursor, DatePredicate, DeleteOutcome, Filter, StoreError, TodoUpdate,
    UpdateOutcome,
};
use crate::models::{Todo, TodoId};

const SELECT_TODOS: &str =
    "SELECT id, body, completed, date, time, created_at, updated_at FROM todos";

#[derive(Debug, FromRow)]
struct TodoRow {
    id: String,
    body: String,
    completed: bool,
    date: String,
    time: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<TodoId>()
            .map_err(|e| StoreError::Decode(format!("invalid id {:?}: {}", row.id, e)))?;

        Ok(Todo {
            id: Some(id),
            body: row.body,
            completed: row.completed,
            date: row.date,
            time: row.time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    qb.push(" WHERE 1 = 1");
    if let Some(id) = &filter.id {
        qb.push(" AND id = ").push_bind(id.to_string());
    }
    match &filter.date {
        Some(DatePredicate::Eq(date)) => {
            qb.push(" AND date = ").push_bind(date.clone());
        }
        Some(DatePredicate::Range { gte, lte }) => {
            qb.push(" AND date >= ").push_bind(gte.clone());
            qb.push(" AND date <= ").push_bind(lte.clone());
        }
        None => {}
    }
}

/// Todo collection backed by the `todos` table.
#[derive(Clone)]
pub struct SqliteCollection {
    pool: SqlitePool,
}

impl SqliteCollection {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Collection for SqliteCollection {
    async fn find(&self, filter: Filter) -> Result<Box<dyn Cursor>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_TODOS);
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY rowid");

        let rows: Vec<TodoRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        Ok(Box::new(SqliteCursor { rows: Some(rows) }))
    }

    async fn insert_one(&self, todo: &Todo) -> Result<TodoId, StoreError> {
        let id = TodoId::new();

        sqlx::query(
            r#"
            INSERT INTO todos
                (id, body, completed, date, time, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(id.to_string())
        .bind(&todo.body)
        .bind(todo.completed)
        .bind(&todo.date)
        .bind(&todo.time)
        .bind(&todo.created_at)
        .bind(&todo.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_one(
        &self,
        filter: Filter,
        update: TodoUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT rowid, completed, updated_at FROM todos",
        );
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY rowid LIMIT 1");

        let current: Option<(i64, bool, String)> = qb
            .build_query_as()
            .fetch_optional(&mut *tx)
            .await?;

        let Some((rowid, completed, updated_at)) = current else {
            return Ok(UpdateOutcome::default());
        };

        sqlx::query(
            r#"
            UPDATE todos
            SET completed = ?1,
                updated_at = ?2
            WHERE rowid = ?3
            "#,
        )
        .bind(update.completed)
        .bind(&update.updated_at)
        .bind(rowid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let modified = completed != update.completed || updated_at != update.updated_at;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, filter: Filter) -> Result<DeleteOutcome, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "DELETE FROM todos WHERE rowid IN (SELECT rowid FROM todos",
        );
        push_filter(&mut qb, &filter);
        qb.push(" ORDER BY rowid LIMIT 1)");

        let deleted_count = qb.build().execute(&self.pool).await?.rows_affected();

        Ok(DeleteOutcome { deleted_count })
    }
}

/// Rows fetched by [`SqliteCollection::find`], decoded when drained.
pub struct SqliteCursor {
    rows: Option<Vec<TodoRow>>,
}

#[async_trait]
impl Cursor for SqliteCursor {
    async fn all(&mut self, out: &mut Vec<Todo>) -> Result<(), StoreError> {
        let rows = self.rows.take().ok_or(StoreError::CursorClosed)?;
        for row in rows {
            out.push(Todo::try_from(row)?);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.rows = None;
        Ok(())
    }
}
