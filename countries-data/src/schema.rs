//! SQLite schema for the countries cache.

use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `countries_schema_version` by [`initialise_schema`].
pub const SCHEMA_VERSION: i64 = 1;

/// Create the cache tables inside an SQLite database.
///
/// Foreign keys are enabled on the connection. Entity tables carry a `UNIQUE`
/// natural key; relation tables use composite primary keys so repeated links
/// collapse into one row. Re-running against an initialised database is a
/// no-op, while a database recorded at another version is rejected.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use countries_data::schema::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("initialising twice is harmless");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM countries_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_entity_tables(&transaction)?;
    create_relation_tables(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction.commit().map_err(|source| SchemaError::Migration {
        step: "commit schema transaction",
        source,
    })
}

fn create_entity_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create countries",
        "CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            capital TEXT NOT NULL DEFAULT '',
            alpha2 TEXT NOT NULL DEFAULT '',
            alpha3 TEXT NOT NULL DEFAULT '',
            numeric_code TEXT NOT NULL DEFAULT '',
            calling_code TEXT NOT NULL DEFAULT '',
            region TEXT NOT NULL DEFAULT '',
            flag_url TEXT NOT NULL DEFAULT ''
        )",
    )?;
    run_migration_step(
        transaction,
        "create currencies",
        "CREATE TABLE IF NOT EXISTS currencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            code TEXT NOT NULL UNIQUE CHECK (length(trim(code)) > 0),
            symbol TEXT NOT NULL DEFAULT ''
        )",
    )?;
    run_migration_step(
        transaction,
        "create langs",
        "CREATE TABLE IF NOT EXISTS langs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            iso639_1 TEXT NOT NULL UNIQUE,
            iso639_2 TEXT NOT NULL DEFAULT '',
            native_name TEXT NOT NULL DEFAULT ''
        )",
    )?;
    run_migration_step(
        transaction,
        "create timezones",
        "CREATE TABLE IF NOT EXISTS timezones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
    )
}

fn create_relation_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create countries_currencies",
        "CREATE TABLE IF NOT EXISTS countries_currencies (
            country INTEGER NOT NULL,
            currency INTEGER NOT NULL,
            PRIMARY KEY (country, currency),
            FOREIGN KEY (country) REFERENCES countries(id) ON DELETE CASCADE,
            FOREIGN KEY (currency) REFERENCES currencies(id) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create countries_timezones",
        "CREATE TABLE IF NOT EXISTS countries_timezones (
            country INTEGER NOT NULL,
            timezone INTEGER NOT NULL,
            PRIMARY KEY (country, timezone),
            FOREIGN KEY (country) REFERENCES countries(id) ON DELETE CASCADE,
            FOREIGN KEY (timezone) REFERENCES timezones(id) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create countries_langs",
        "CREATE TABLE IF NOT EXISTS countries_langs (
            country INTEGER NOT NULL,
            lang INTEGER NOT NULL,
            PRIMARY KEY (country, lang),
            FOREIGN KEY (country) REFERENCES countries(id) ON DELETE CASCADE,
            FOREIGN KEY (lang) REFERENCES langs(id) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS countries_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing: Option<i64> = transaction
        .query_row(
            "SELECT version FROM countries_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO countries_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(drop)
            .map_err(|source| SchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(drop)
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the cache schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// `PRAGMA foreign_keys` could not be enabled.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Underlying SQLite failure.
        #[source]
        source: SqliteError,
    },
    /// A DDL step failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step label.
        step: &'static str,
        /// Underlying SQLite failure.
        #[source]
        source: SqliteError,
    },
    /// The database was created by a different schema version.
    #[error(
        "expected countries schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}
