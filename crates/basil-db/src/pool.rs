//! # Database Pool Management
//!
//! Connection pool setup for the approval-workflow store.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Pool Lifecycle                                        │
//! │                                                                         │
//! │  server startup                       test setup                       │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  DbConfig::new("basil.db")           DbConfig::in_memory()             │
//! │       │                                    │                            │
//! │       └────────────────┬───────────────────┘                            │
//! │                        ▼                                                │
//! │          Database::new(config).await                                   │
//! │            1. open pool (WAL, foreign keys ON)                         │
//! │            2. run embedded migrations                                  │
//! │                        │                                                │
//! │                        ▼                                                │
//! │          db.workflows() / db.organizations()                           │
//! │                                                                         │
//! │  Repositories are built from the injected pool. There is no           │
//! │  module-level client singleton, so every test gets an isolated        │
//! │  database and nothing leaks between them.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL journal mode keeps workflow reads (every expense submission resolves
//! the active workflow) from blocking on the rare administrative write.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::organization::OrganizationRepository;
use crate::repository::workflow::WorkflowRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool configuration, consumed by [`Database::new`].
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/basil.db").max_connections(8);
/// let db = Database::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite database file, created on first connect.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// Connections kept warm while idle.
    pub min_connections: u32,

    /// How long to wait for a free connection before giving up.
    pub connect_timeout: Duration,

    /// Idle time after which a pooled connection is dropped.
    pub idle_timeout: Duration,

    /// Apply pending migrations during [`Database::new`].
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration with production defaults for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the connection cap.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the warm-connection floor.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables migrating on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// An isolated in-memory database for tests.
    ///
    /// Capped at one connection: each SQLite `:memory:` connection is its own
    /// database, so a second pooled connection would see empty tables.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Owner of the connection pool; hands out repository handles.
///
/// Cheap to clone (the pool is internally reference-counted), so request
/// handlers can each hold their own copy.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./basil.db")).await?;
/// let active = db.organizations().get_active_workflow(&org_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    ///
    /// SQLite options: WAL journal, NORMAL synchronous, and foreign keys ON
    /// (off by default in SQLite; the workflow tree and the active-pointer
    /// guard both rely on them).
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening workflow database"
        );

        let connect_options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            "Pool established"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent; called by [`Database::new`]
    /// unless the config disables it.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// The underlying pool, for queries the repositories don't cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Workflow-definition CRUD.
    pub fn workflows(&self) -> WorkflowRepository {
        WorkflowRepository::new(self.pool.clone())
    }

    /// Organizations and the active-workflow pointer.
    pub fn organizations(&self) -> OrganizationRepository {
        OrganizationRepository::new(self.pool.clone())
    }

    /// Drains and closes the pool; subsequent repository calls fail.
    pub async fn close(&self) {
        info!("Closing workflow database");
        self.pool.close().await;
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_migrates_and_answers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/basil-test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
    }
}
