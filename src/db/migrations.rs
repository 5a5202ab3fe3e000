//! Versioned schema upgrades.
//!
//! The schema is an ordered list of embedded diesel migrations. Diesel records
//! every applied version in `__diesel_schema_migrations`, so running the list
//! again is a no-op and startup never probes individual columns.

use std::{error::Error as StdError, fmt, time::Duration};

use cfg_if::cfg_if;
use diesel::result::{Error as DieselError, QueryResult};
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
use diesel::{Connection, result::ConnectionError};
use diesel_migrations::MigrationHarness;
use tokio::time::timeout;
use tracing::info;

use super::connection::{DbConnection, MIGRATIONS};

#[derive(Debug)]
struct MigrationHarnessError(Box<dyn StdError + Send + Sync>);

impl fmt::Display for MigrationHarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "migration harness error: {}", self.0)
    }
}

impl StdError for MigrationHarnessError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> { Some(&*self.0) }
}

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
#[derive(Debug)]
struct MigrationConnectionError(ConnectionError);

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
impl fmt::Display for MigrationConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "migration connection error: {}", self.0)
    }
}

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
impl StdError for MigrationConnectionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> { Some(&self.0) }
}

#[derive(Debug, Clone, Copy)]
struct MigrationTimeoutError(Duration);

impl fmt::Display for MigrationTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "migration execution exceeded {:?}", self.0)
    }
}

impl StdError for MigrationTimeoutError {}

const MIGRATION_TIMEOUT: Duration = Duration::from_secs(5);

fn harness_error(e: Box<dyn StdError + Send + Sync>) -> DieselError {
    DieselError::SerializationError(Box::new(MigrationHarnessError(e)))
}

fn timeout_error() -> DieselError {
    DieselError::SerializationError(Box::new(MigrationTimeoutError(MIGRATION_TIMEOUT)))
}

/// Apply every pending migration on a blocking connection, returning the
/// versions that were applied in order.
fn apply_pending<C>(conn: &mut C) -> QueryResult<Vec<String>>
where
    C: MigrationHarness<super::connection::Backend>,
{
    if let Ok(false) = conn.has_pending_migration(MIGRATIONS) {
        info!("schema is current; no migrations to apply");
        return Ok(Vec::new());
    }
    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(harness_error)?
        .into_iter()
        .map(|version| version.to_string())
        .collect();
    for version in &applied {
        info!(%version, "applied schema migration");
    }
    Ok(applied)
}

cfg_if! {
    if #[cfg(feature = "sqlite")] {
        /// Run embedded database migrations.
        ///
        /// Returns the versions applied by this call; an already current
        /// schema yields an empty list.
        ///
        /// # Errors
        /// Returns any error produced by Diesel while running migrations, or a
        /// serialization error when the run exceeds the migration timeout.
        #[must_use = "handle the result"]
        pub async fn run_migrations(conn: &mut DbConnection) -> QueryResult<Vec<String>> {
            timeout(MIGRATION_TIMEOUT, conn.spawn_blocking(|c| apply_pending(c)))
                .await
                .map_err(|_| timeout_error())?
        }
    } else if #[cfg(all(feature = "postgres", not(feature = "sqlite")))] {
        /// Run embedded database migrations.
        ///
        /// Returns the versions applied by this call; an already current
        /// schema yields an empty list.
        ///
        /// # Errors
        /// Returns any error produced by Diesel while running migrations.
        #[must_use = "handle the result"]
        pub async fn run_migrations(database_url: &str) -> QueryResult<Vec<String>> {
            use diesel::pg::PgConnection;
            use tokio::task;
            let url = database_url.to_owned();
            timeout(
                MIGRATION_TIMEOUT,
                task::spawn_blocking(move || -> QueryResult<Vec<String>> {
                    let mut conn = PgConnection::establish(&url).map_err(|e| {
                        DieselError::SerializationError(Box::new(MigrationConnectionError(e)))
                    })?;
                    apply_pending(&mut conn)
                }),
            )
            .await
            .map_err(|_| timeout_error())?
            .map_err(|e| DieselError::SerializationError(Box::new(e)))?
        }
    }
}

/// Apply embedded migrations for the current backend.
///
/// # Errors
/// Returns any error produced by Diesel while running migrations.
#[cfg(feature = "sqlite")]
#[must_use = "handle the result"]
pub async fn apply_migrations(
    conn: &mut DbConnection,
    _database_url: &str,
) -> QueryResult<Vec<String>> {
    run_migrations(conn).await
}

/// Apply embedded migrations for the current backend.
///
/// # Errors
/// Returns any error produced by Diesel while running migrations.
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
#[must_use = "handle the result"]
pub async fn apply_migrations(conn: &mut DbConnection, url: &str) -> QueryResult<Vec<String>> {
    let _ = conn;
    run_migrations(url).await
}
