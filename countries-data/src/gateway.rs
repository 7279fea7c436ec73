//! Storage Gateway: parameterised statements over a relational store.
//!
//! Callers describe work as a [`Statement`] (SQL text plus bound [`Value`]s)
//! and receive either an affected-row count or a sequence of [`Row`]s. Values
//! are always bound, never spliced into SQL text. [`SqliteGateway`] is the
//! production implementation over `rusqlite`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use countries_core::EntityId;
use rusqlite::{
    Connection, Error as SqliteError, ToSql, params_from_iter,
    types::{ToSqlOutput, ValueRef},
};
use thiserror::Error;

use crate::schema::{SchemaError, initialise_schema};

/// A value bound to, or read from, a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Self::Integer(id.get())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Self::Integer(value) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

/// SQL text with positional parameters.
///
/// # Examples
/// ```
/// use countries_data::gateway::{Statement, Value};
///
/// let statement = Statement::new("SELECT id FROM currencies WHERE code = ?1").bind("NGN");
/// assert_eq!(statement.params(), &[Value::Text("NGN".into())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: &'static str,
    params: Vec<Value>,
}

impl Statement {
    /// Start a statement with no bound parameters.
    #[must_use]
    pub const fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// SQL text.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        self.sql
    }

    /// Bound parameters in position order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Errors raised when reading a column from a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The row has no column with the requested name.
    #[error("row has no column named {column:?}")]
    MissingColumn {
        /// Requested column.
        column: String,
    },
    /// The column holds a value of another type.
    #[error("column {column:?} is not {expected}")]
    UnexpectedType {
        /// Requested column.
        column: String,
        /// Type the caller asked for.
        expected: &'static str,
    },
}

/// One result row, addressable by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Build a row from name/value pairs.
    #[must_use]
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Raw value of `column`.
    pub fn value(&self, column: &str) -> Result<&Value, RowError> {
        self.columns
            .iter()
            .find_map(|(name, value)| (name == column).then_some(value))
            .ok_or_else(|| RowError::MissingColumn {
                column: column.to_owned(),
            })
    }

    /// Integer value of `column`.
    pub fn integer(&self, column: &str) -> Result<i64, RowError> {
        match self.value(column)? {
            Value::Integer(value) => Ok(*value),
            _ => Err(RowError::UnexpectedType {
                column: column.to_owned(),
                expected: "an integer",
            }),
        }
    }

    /// Identifier held in `column`.
    pub fn id(&self, column: &str) -> Result<EntityId, RowError> {
        self.integer(column).map(EntityId::new)
    }

    /// Text value of `column`.
    pub fn text(&self, column: &str) -> Result<String, RowError> {
        match self.value(column)? {
            Value::Text(value) => Ok(value.clone()),
            _ => Err(RowError::UnexpectedType {
                column: column.to_owned(),
                expected: "text",
            }),
        }
    }
}

/// Minimal relational access used by the loader and the reconciler.
pub trait StorageGateway {
    /// Run a write statement, returning the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> Result<usize, GatewayError>;

    /// Run a read statement, returning every row.
    fn query(&self, statement: &Statement) -> Result<Vec<Row>, GatewayError>;

    /// Identifier generated by the most recent successful insert.
    fn last_insert_id(&self) -> EntityId;
}

/// Errors raised by [`SqliteGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The database's parent directory could not be created.
    #[error("failed to create database directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The database could not be opened.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: PathBuf,
        /// Underlying SQLite failure.
        #[source]
        source: SqliteError,
    },
    /// Schema initialisation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A statement failed to prepare or run.
    #[error("failed to {operation} `{sql}`")]
    Sqlite {
        /// Stage that failed.
        operation: &'static str,
        /// Statement text.
        sql: &'static str,
        /// Underlying SQLite failure.
        #[source]
        source: SqliteError,
    },
    /// A column held a type the gateway does not model.
    #[error("column {column:?} of `{sql}` holds an unsupported {found} value")]
    UnsupportedValue {
        /// Statement text.
        sql: &'static str,
        /// Offending column.
        column: String,
        /// SQLite storage class found.
        found: &'static str,
    },
}

/// [`StorageGateway`] over a single SQLite connection.
///
/// # Examples
/// ```
/// use countries_data::gateway::{SqliteGateway, Statement, StorageGateway};
///
/// let mut gateway = SqliteGateway::open_in_memory().expect("open database");
/// let inserted = gateway
///     .execute(&Statement::new("INSERT INTO timezones (name) VALUES (?1)").bind("UTC+01:00"))
///     .expect("insert timezone");
/// assert_eq!(inserted, 1);
/// assert_eq!(gateway.last_insert_id().get(), 1);
///
/// let rows = gateway
///     .query(&Statement::new("SELECT id, name FROM timezones"))
///     .expect("query timezones");
/// assert_eq!(rows[0].text("name").as_deref(), Ok("UTC+01:00"));
/// ```
#[derive(Debug)]
pub struct SqliteGateway {
    connection: Connection,
}

impl SqliteGateway {
    /// Open (creating if needed) the database at `path` and initialise the
    /// schema. Missing parent directories are created.
    pub fn open(path: &Path) -> Result<Self, GatewayError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| GatewayError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let connection = Connection::open(path).map_err(|source| GatewayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(connection)
    }

    /// Open a private in-memory database with the schema initialised.
    pub fn open_in_memory() -> Result<Self, GatewayError> {
        let connection = Connection::open_in_memory().map_err(|source| GatewayError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::with_connection(connection)
    }

    /// Wrap an existing connection, initialising the schema on it.
    pub fn with_connection(mut connection: Connection) -> Result<Self, GatewayError> {
        initialise_schema(&mut connection)?;
        Ok(Self { connection })
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl StorageGateway for SqliteGateway {
    fn execute(&mut self, statement: &Statement) -> Result<usize, GatewayError> {
        let sql = statement.sql();
        let mut prepared = self
            .connection
            .prepare_cached(sql)
            .map_err(|source| GatewayError::Sqlite {
                operation: "prepare",
                sql,
                source,
            })?;
        prepared
            .execute(params_from_iter(statement.params()))
            .map_err(|source| GatewayError::Sqlite {
                operation: "execute",
                sql,
                source,
            })
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>, GatewayError> {
        let sql = statement.sql();
        let sqlite_error = |operation: &'static str| move |source: SqliteError| GatewayError::Sqlite {
            operation,
            sql,
            source,
        };
        let mut prepared = self
            .connection
            .prepare_cached(sql)
            .map_err(sqlite_error("prepare"))?;
        let names: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let mut cursor = prepared
            .query(params_from_iter(statement.params()))
            .map_err(sqlite_error("query"))?;

        let mut rows = Vec::new();
        while let Some(raw) = cursor.next().map_err(sqlite_error("step"))? {
            let mut columns = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                let value = raw.get_ref(index).map_err(sqlite_error("read column"))?;
                columns.push((name.clone(), read_value(sql, name, value)?));
            }
            rows.push(Row::new(columns));
        }
        Ok(rows)
    }

    fn last_insert_id(&self) -> EntityId {
        EntityId::new(self.connection.last_insert_rowid())
    }
}

fn read_value(sql: &'static str, column: &str, value: ValueRef<'_>) -> Result<Value, GatewayError> {
    let unsupported = |found| GatewayError::UnsupportedValue {
        sql,
        column: column.to_owned(),
        found,
    };
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(number) => Ok(Value::Integer(number)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Value::Text(text.to_owned()))
            .map_err(|_| unsupported("non-UTF-8 text")),
        ValueRef::Real(_) => Err(unsupported("real")),
        ValueRef::Blob(_) => Err(unsupported("blob")),
    }
}
