//! Instrumented in-memory task store.
//!
//! The store counts acquisitions, releases, and statements so callers can
//! assert on connection discipline, and it can be told to fail in the ways a
//! real database does.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{NewTask, PersistedTaskData, Task, TaskId},
    ports::{TaskSession, TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
pub struct InMemoryTaskStore<C = DefaultClock> {
    state: Arc<RwLock<InMemoryState>>,
    probe: Arc<StoreProbe>,
    faults: Arc<FaultPlan>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    table_exists: bool,
    rows: Vec<Task>,
    last_id: i64,
}

#[derive(Debug, Default)]
struct FaultPlan {
    failing_acquisitions: AtomicUsize,
    failing_queries: AtomicBool,
    failing_schema: AtomicBool,
    table_race: AtomicBool,
    opaque_table_race: AtomicBool,
}

/// Counters describing how a store has been used.
#[derive(Debug, Default)]
pub struct StoreProbe {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    statements: AtomicUsize,
}

impl StoreProbe {
    /// Number of sessions handed out.
    #[must_use]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of sessions returned to the store.
    #[must_use]
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Number of statements issued across all sessions.
    #[must_use]
    pub fn statements(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    /// Sessions acquired but not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.acquisitions().saturating_sub(self.releases())
    }
}

impl InMemoryTaskStore<DefaultClock> {
    /// Creates an empty store without a `tasks` table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryTaskStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            probe: Arc::clone(&self.probe),
            faults: Arc::clone(&self.faults),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates an empty store stamping rows with the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryState::default())),
            probe: Arc::new(StoreProbe::default()),
            faults: Arc::new(FaultPlan::default()),
            clock,
        }
    }

    /// Creates the `tasks` table up front, as a warm database would have.
    #[must_use]
    pub fn with_table(self) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.table_exists = true;
        }
        self
    }

    /// Inserts pre-built rows, creating the table if needed.
    ///
    /// Seeded rows keep their identifiers and timestamps; later inserts are
    /// numbered after the largest seeded identifier.
    #[must_use]
    pub fn with_rows(self, rows: impl IntoIterator<Item = Task>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.table_exists = true;
            for row in rows {
                state.last_id = state.last_id.max(row.id().value());
                state.rows.push(row);
            }
        }
        self
    }

    /// Returns usage counters shared by every clone of this store.
    #[must_use]
    pub fn probe(&self) -> &StoreProbe {
        &self.probe
    }

    /// Makes the next `count` acquisitions fail with a connection error.
    pub fn fail_next_acquisitions(&self, count: usize) {
        self.faults
            .failing_acquisitions
            .store(count, Ordering::SeqCst);
    }

    /// Makes task queries (listing and inserting) fail with a persistence
    /// error. Pings and schema statements are unaffected.
    pub fn fail_queries(&self, enabled: bool) {
        self.faults.failing_queries.store(enabled, Ordering::SeqCst);
    }

    /// Makes the table existence check and creation fail.
    pub fn fail_schema_statements(&self, enabled: bool) {
        self.faults.failing_schema.store(enabled, Ordering::SeqCst);
    }

    /// Simulates another process creating the table between the existence
    /// check and the `CREATE TABLE` of the next session to try.
    pub fn race_table_creation(&self) {
        self.faults.table_race.store(true, Ordering::SeqCst);
    }

    /// Like [`Self::race_table_creation`], but the losing `CREATE TABLE`
    /// fails with a generic persistence error, as a catalog index collision
    /// does.
    pub fn race_table_creation_opaquely(&self) {
        self.faults.opaque_table_race.store(true, Ordering::SeqCst);
    }

    /// Reports whether the `tasks` table has been created.
    #[must_use]
    pub fn has_table(&self) -> bool {
        self.state.read().is_ok_and(|state| state.table_exists)
    }

    /// Returns a copy of the stored rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> Vec<Task> {
        self.state
            .read()
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }

    fn take_acquisition_failure(&self) -> bool {
        self.faults
            .failing_acquisitions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

fn lock_error(err: impl ToString) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    type Session = InMemorySession<C>;

    async fn acquire(&self) -> TaskStoreResult<Self::Session> {
        if self.take_acquisition_failure() {
            return Err(TaskStoreError::connection(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.probe.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(InMemorySession {
            store: self.clone(),
        })
    }
}

/// Session over an [`InMemoryTaskStore`].
///
/// Dropping the session counts as one release.
pub struct InMemorySession<C = DefaultClock> {
    store: InMemoryTaskStore<C>,
}

#[derive(Debug, Clone, Copy)]
enum StatementKind {
    Ping,
    Schema,
    Query,
}

impl<C> InMemorySession<C> {
    fn begin_statement(&self, kind: StatementKind) -> TaskStoreResult<()> {
        self.store.probe.statements.fetch_add(1, Ordering::SeqCst);
        let faults = &self.store.faults;
        let failing = match kind {
            StatementKind::Ping => false,
            StatementKind::Schema => faults.failing_schema.load(Ordering::SeqCst),
            StatementKind::Query => faults.failing_queries.load(Ordering::SeqCst),
        };
        if failing {
            return Err(TaskStoreError::persistence(std::io::Error::other(
                "statement failed",
            )));
        }
        Ok(())
    }
}

impl<C> Drop for InMemorySession<C> {
    fn drop(&mut self) {
        self.store.probe.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<C> TaskSession for InMemorySession<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn ping(&mut self) -> TaskStoreResult<()> {
        self.begin_statement(StatementKind::Ping)
    }

    async fn table_exists(&mut self) -> TaskStoreResult<bool> {
        self.begin_statement(StatementKind::Schema)?;
        let state = self.store.state.read().map_err(lock_error)?;
        Ok(state.table_exists)
    }

    async fn create_table(&mut self) -> TaskStoreResult<()> {
        self.begin_statement(StatementKind::Schema)?;
        let mut state = self.store.state.write().map_err(lock_error)?;
        let faults = &self.store.faults;
        if faults.opaque_table_race.swap(false, Ordering::SeqCst) {
            state.table_exists = true;
            return Err(TaskStoreError::persistence(std::io::Error::other(
                "duplicate key value violates unique constraint \"pg_class_relname_nsp_index\"",
            )));
        }
        let raced = faults.table_race.swap(false, Ordering::SeqCst);
        if state.table_exists || raced {
            state.table_exists = true;
            return Err(TaskStoreError::TableAlreadyExists);
        }
        state.table_exists = true;
        Ok(())
    }

    async fn list_tasks(&mut self) -> TaskStoreResult<Vec<Task>> {
        self.begin_statement(StatementKind::Query)?;
        let state = self.store.state.read().map_err(lock_error)?;
        if !state.table_exists {
            return Err(missing_table());
        }
        let mut rows = state.rows.clone();
        rows.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id()))
        });
        Ok(rows)
    }

    async fn insert_task(&mut self, task: &NewTask) -> TaskStoreResult<Task> {
        self.begin_statement(StatementKind::Query)?;
        let mut state = self.store.state.write().map_err(lock_error)?;
        if !state.table_exists {
            return Err(missing_table());
        }
        state.last_id += 1;
        let row = Task::from_persisted(PersistedTaskData {
            id: TaskId::new(state.last_id),
            description: task.description().clone(),
            created_at: self.store.clock.utc(),
        });
        state.rows.push(row.clone());
        Ok(row)
    }
}

fn missing_table() -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "relation \"tasks\" does not exist",
    ))
}
