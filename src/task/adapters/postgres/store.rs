//! `PostgreSQL` store implementation for task storage.

use super::{
    events::{PoolErrorLogger, PoolEventLogger},
    models::{NewTaskRow, TableExistsRow, TaskRow},
    schema::tasks,
};
use crate::config::DatabaseConfig;
use crate::task::{
    domain::{Description, NewTask, PersistedTaskData, Task, TaskId},
    ports::{TaskSession, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the task store.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

type PooledPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Statement creating the `tasks` table.
///
/// Issued without `IF NOT EXISTS`; a concurrent creation surfaces as
/// [`TaskStoreError::TableAlreadyExists`].
pub const CREATE_TASKS_TABLE_SQL: &str = concat!(
    "CREATE TABLE tasks (",
    "id BIGSERIAL PRIMARY KEY, ",
    "description TEXT NOT NULL, ",
    "created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP",
    ")",
);

const TABLE_EXISTS_SQL: &str = concat!(
    "SELECT EXISTS (",
    "SELECT FROM information_schema.tables ",
    "WHERE table_schema = current_schema() AND table_name = $1",
    ") AS table_exists",
);

/// Catalog unique indexes hit when two sessions create the same table (or
/// its `BIGSERIAL` sequence) at once.
const CATALOG_UNIQUE_INDEXES: [&str; 2] =
    ["pg_type_typname_nsp_index", "pg_class_relname_nsp_index"];

/// `PostgreSQL`-backed task store.
///
/// Construct one per process and share it; dropping the last clone closes the
/// pool.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a store from an existing connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily-connecting pool from configuration.
    ///
    /// No connection is opened until the first session is acquired, so the
    /// process starts even when the database is unreachable.
    #[must_use]
    pub fn connect(config: &DatabaseConfig) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(config.connection_string());
        let pool = Pool::builder()
            .max_size(config.pool_size())
            .min_idle(Some(0))
            .connection_timeout(config.connect_timeout())
            .event_handler(Box::new(PoolEventLogger))
            .error_handler(Box::new(PoolErrorLogger))
            .build_unchecked(manager);
        Self::new(pool)
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &TaskPgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    type Session = PostgresTaskSession;

    async fn acquire(&self) -> TaskStoreResult<Self::Session> {
        let pool = self.pool.clone();
        let connection = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(TaskStoreError::persistence)?
            .map_err(TaskStoreError::connection)?;
        Ok(PostgresTaskSession {
            connection: Some(connection),
        })
    }
}

/// Session holding one pooled `PostgreSQL` connection.
///
/// The connection returns to the pool when the session is dropped.
pub struct PostgresTaskSession {
    connection: Option<PooledPgConnection>,
}

impl PostgresTaskSession {
    /// Runs `f` on the blocking thread pool, handing the connection over and
    /// taking it back afterwards.
    async fn run_blocking<F, T>(&mut self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut connection = self.connection.take().ok_or_else(|| {
            TaskStoreError::connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "session connection was lost by an earlier failed statement",
            ))
        })?;
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut connection);
            (connection, result)
        })
        .await
        .map_err(TaskStoreError::persistence)?;
        self.connection = Some(returned);
        result
    }
}

#[async_trait]
impl TaskSession for PostgresTaskSession {
    async fn ping(&mut self) -> TaskStoreResult<()> {
        self.run_blocking(|connection| {
            diesel::sql_query("SELECT 1")
                .execute(connection)
                .map(|_| ())
                .map_err(map_statement_error)
        })
        .await
    }

    async fn table_exists(&mut self) -> TaskStoreResult<bool> {
        self.run_blocking(|connection| {
            diesel::sql_query(TABLE_EXISTS_SQL)
                .bind::<diesel::sql_types::Text, _>("tasks")
                .get_result::<TableExistsRow>(connection)
                .map(|row| row.table_exists)
                .map_err(map_statement_error)
        })
        .await
    }

    async fn create_table(&mut self) -> TaskStoreResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(CREATE_TASKS_TABLE_SQL)
                .map_err(|err| {
                    if is_duplicate_table(&err) {
                        TaskStoreError::TableAlreadyExists
                    } else {
                        map_statement_error(err)
                    }
                })
        })
        .await
    }

    async fn list_tasks(&mut self) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .select(TaskRow::as_select())
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .load::<TaskRow>(connection)
                .map_err(map_statement_error)?;
            Ok(rows.into_iter().map(row_to_task).collect())
        })
        .await
    }

    async fn insert_task(&mut self, task: &NewTask) -> TaskStoreResult<Task> {
        let description = task.description().as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = diesel::insert_into(tasks::table)
                .values(&NewTaskRow {
                    description: &description,
                })
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .map_err(map_statement_error)?;
            Ok(row_to_task(row))
        })
        .await
    }
}

fn row_to_task(row: TaskRow) -> Task {
    let TaskRow {
        id,
        description,
        created_at,
    } = row;
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(id),
        description: Description::from_persisted(description),
        created_at,
    })
}

fn map_statement_error(err: DieselError) -> TaskStoreError {
    match &err {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TaskStoreError::connection(err)
        }
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation,
            _,
        ) => TaskStoreError::constraint(err),
        _ => TaskStoreError::persistence(err),
    }
}

fn is_duplicate_table(err: &DieselError) -> bool {
    let DieselError::DatabaseError(kind, info) = err else {
        return false;
    };
    let catalog_collision = matches!(kind, DatabaseErrorKind::UniqueViolation)
        && info
            .constraint_name()
            .is_some_and(|name| CATALOG_UNIQUE_INDEXES.contains(&name));
    catalog_collision || info.message().contains("already exists")
}
