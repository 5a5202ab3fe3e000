//! Backend feature audits ensure required DB capabilities are available.

use diesel::{QueryableByName, result::Error as DieselError, result::QueryResult};
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;

#[cfg(feature = "sqlite")]
const SQLITE_MIN_VERSION: (u32, u32) = (3, 35);

#[cfg(feature = "postgres")]
const POSTGRES_MIN_MAJOR: u32 = 12;

fn audit_error(message: String) -> DieselError {
    DieselError::QueryBuilderError(Box::new(std::io::Error::other(message)))
}

/// Verify that `SQLite` supports the statements issued by the stores.
///
/// Inserts rely on `RETURNING`, which needs `SQLite` 3.35 or newer, and the
/// duplicate check and random pool both call scalar functions in `WHERE` and
/// `ORDER BY` clauses.
///
/// # Errors
/// Returns any error produced by the probe queries, or an error naming the
/// detected version when it is too old.
#[cfg(feature = "sqlite")]
#[must_use = "handle the result"]
pub async fn audit_sqlite_features(conn: &mut DbConnection) -> QueryResult<()> {
    use diesel::{sql_query, sql_types::Text};

    #[derive(QueryableByName)]
    struct SqliteVersion {
        #[diesel(sql_type = Text)]
        version: String,
    }

    let row: SqliteVersion = sql_query("SELECT sqlite_version() AS version")
        .get_result(conn)
        .await?;
    let mut parts = row.version.split('.').map(str::parse::<u32>);
    let (Some(Ok(major)), Some(Ok(minor))) = (parts.next(), parts.next()) else {
        return Err(audit_error(format!(
            "unable to parse sqlite version: {}",
            row.version
        )));
    };
    if (major, minor) < SQLITE_MIN_VERSION {
        return Err(audit_error(format!(
            "sqlite version {} is not supported (require >= {}.{})",
            row.version, SQLITE_MIN_VERSION.0, SQLITE_MIN_VERSION.1
        )));
    }

    sql_query("SELECT LOWER(TRIM('  Probe  ')), RANDOM()")
        .execute(conn)
        .await?;

    Ok(())
}

/// Verify that the Postgres server meets application requirements.
///
/// # Errors
/// Returns any error produced by the version query or if the version string
/// cannot be parsed or is older than the supported minimum.
#[cfg(feature = "postgres")]
#[must_use = "handle the result"]
pub async fn audit_postgres_features(conn: &mut DbConnection) -> QueryResult<()> {
    use diesel::{sql_query, sql_types::Text};

    #[derive(QueryableByName)]
    struct PgVersion {
        #[diesel(sql_type = Text)]
        version: String,
    }

    let row: PgVersion = sql_query("SELECT version()").get_result(conn).await?;

    let major = row
        .version
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.split('.').next())
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| audit_error(format!("unable to parse postgres version: {}", row.version)))?;

    if major < POSTGRES_MIN_MAJOR {
        return Err(audit_error(format!(
            "postgres version {major} is not supported (require >= {POSTGRES_MIN_MAJOR})"
        )));
    }

    Ok(())
}
