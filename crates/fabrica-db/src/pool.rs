//! # Connection Provider
//!
//! Knows where the database lives and hands out connections.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Connection Per Call                              │
//! │                                                                         │
//! │  repository call ──► checkout(pool) ──► PoolConnection                  │
//! │                           │                  │                          │
//! │                           │                  ├─ one statement, or       │
//! │                           │                  └─ one transaction         │
//! │                           │                  │                          │
//! │                           ▼                  ▼                          │
//! │                  PoolExhausted /        dropped: back to the pool       │
//! │                  ConnectionFailed                                       │
//! │                                                                         │
//! │  DbLocation::File    WAL, NORMAL sync, foreign keys, file created       │
//! │  DbLocation::Memory  one connection kept open for the pool's lifetime   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::support::SupportRepository;
use crate::repository::user::UserRepository;

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A SQLite file, created on first open.
    File(PathBuf),
    /// A private in-memory database, gone when the pool closes.
    Memory,
}

/// How to open the database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Pool size. Forced to 1 for [`DbLocation::Memory`].
    pub max_connections: u32,
    /// How long a call waits for a free connection.
    pub acquire_timeout: Duration,
    /// Apply pending migrations when opening.
    pub migrate: bool,
}

impl DbConfig {
    /// A database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            migrate: true,
        }
    }

    /// An isolated, migrated in-memory database. Used by the tests.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens the database as is, leaving the schema untouched.
    pub fn without_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };
        Ok(options.foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.location {
            DbLocation::File(_) => options.max_connections(self.max_connections.max(1)),
            // Every new connection would see an empty database
            DbLocation::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

/// Checks out one connection from `pool`.
///
/// The connection returns to the pool when dropped.
pub(crate) async fn checkout(pool: &SqlitePool) -> DbResult<PoolConnection<Sqlite>> {
    pool.acquire().await.map_err(|e| {
        let err = DbError::from(e);
        if matches!(err, DbError::PoolExhausted) {
            warn!(size = pool.size(), "No free database connection");
        }
        err
    })
}

/// Handle on the open database. Clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./fabrica.db")).await?;
/// if db.users().verify_login("ana@fabrica.es", "secreto").await? {
///     let stock = db.products().list_all().await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, migrates the schema.
    ///
    /// ## Returns
    /// * `Err(DbError::ConnectionFailed)` - File can't be opened or created
    /// * `Err(DbError::MigrationFailed)` - Schema could not be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }

        debug!(connections = db.pool.size(), "Database ready");
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// The underlying pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A live connection for the caller's exclusive use, released on drop.
    ///
    /// ## Returns
    /// * `Err(DbError::PoolExhausted)` - None freed up within the timeout
    /// * `Err(DbError::ConnectionFailed)` - The database has been closed
    pub async fn acquire(&self) -> DbResult<PoolConnection<Sqlite>> {
        checkout(&self.pool).await
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn support(&self) -> SupportRepository {
        SupportRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool. Later calls
    /// fail with `ConnectionFailed`.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database closed");
    }

    /// Whether a connection can be had and answers `SELECT 1`.
    pub async fn health_check(&self) -> bool {
        match self.acquire().await {
            Ok(mut conn) => sqlx::query("SELECT 1").execute(&mut *conn).await.is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_memory_data_outlives_each_call() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().register("ana@fabrica.es", "secreto").await.unwrap();

        for _ in 0..3 {
            let mut conn = db.acquire().await.unwrap();
            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
            assert_eq!(users, 1);
        }
    }

    #[tokio::test]
    async fn test_held_connection_blocks_the_next_caller() {
        let config = DbConfig::in_memory().acquire_timeout(Duration::from_millis(50));
        let db = Database::new(config).await.unwrap();

        let held = db.acquire().await.unwrap();
        assert!(matches!(db.acquire().await, Err(DbError::PoolExhausted)));

        drop(held);
        assert!(db.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_closed_database_refuses_connections() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
        assert!(matches!(
            db.acquire().await,
            Err(DbError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_unmigrated_database_has_no_tables() {
        let db = Database::new(DbConfig::in_memory().without_migrations())
            .await
            .unwrap();
        assert!(db.users().exists_by_email("ana@fabrica.es").await.is_err());

        db.run_migrations().await.unwrap();
        assert!(!db.users().exists_by_email("ana@fabrica.es").await.unwrap());
    }

    #[test]
    fn test_file_config() {
        let config = DbConfig::new("/tmp/fabrica.db")
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(3));

        assert_eq!(config.location, DbLocation::File(PathBuf::from("/tmp/fabrica.db")));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert!(config.migrate);
    }
}
