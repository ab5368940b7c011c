//! Cluster lifecycle helpers for `PostgreSQL` integration tests.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use postgresql_embedded::PostgreSQL;
use rstest::fixture;
use std::sync::OnceLock;
use taskboard::task::adapters::postgres::PostgresTaskStore;
use tokio::runtime::Runtime;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();

/// Shared `PostgreSQL` cluster handle for integration tests.
pub type PostgresCluster = &'static ManagedCluster;

/// Embedded `PostgreSQL` cluster shared by every test in the binary.
pub struct ManagedCluster {
    runtime: Runtime,
    postgres: PostgreSQL,
}

impl ManagedCluster {
    fn start() -> Result<Self, BoxError> {
        let runtime = test_runtime()?;
        let mut postgres = PostgreSQL::default();
        runtime.block_on(async {
            postgres.setup().await?;
            postgres.start().await
        })?;
        Ok(Self { runtime, postgres })
    }

    /// Returns a connection URL for `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.postgres.settings().url(database)
    }

    /// Creates an empty database named `database`.
    pub fn create_database(&self, database: &str) -> Result<(), BoxError> {
        self.runtime
            .block_on(self.postgres.create_database(database))?;
        Ok(())
    }

    /// Drops `database` if it exists.
    pub fn drop_database(&self, database: &str) -> Result<(), BoxError> {
        self.runtime.block_on(self.postgres.drop_database(database))?;
        Ok(())
    }
}

/// Starts the shared cluster on first use.
#[fixture]
pub fn postgres_cluster() -> PostgresCluster {
    SHARED_CLUSTER.get_or_init(|| ManagedCluster::start().expect("embedded PostgreSQL starts"))
}

/// Builds a multi-threaded runtime for driving async store calls from sync
/// tests.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?)
}

/// Fresh database on the shared cluster, dropped when the guard goes away.
pub struct TemporaryDatabase {
    cluster: PostgresCluster,
    name: String,
}

impl TemporaryDatabase {
    /// Creates a uniquely named database.
    pub fn create(cluster: PostgresCluster) -> Result<Self, BoxError> {
        let name = format!("taskboard_test_{}", Uuid::new_v4().simple());
        cluster.create_database(&name)?;
        Ok(Self { cluster, name })
    }

    /// Returns a store over a small pool connected to this database.
    pub fn store(&self) -> Result<PostgresTaskStore, BoxError> {
        let manager = ConnectionManager::<PgConnection>::new(self.cluster.database_url(&self.name));
        let pool = Pool::builder().max_size(4).build(manager)?;
        Ok(PostgresTaskStore::new(pool))
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let _ = self.cluster.drop_database(&self.name);
    }
}
