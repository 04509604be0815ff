/*!
 * Database connection management.
 *
 * This module wraps the two supported SQL engines, SQLite through rusqlite and
 * PostgreSQL through the synchronous postgres client, behind the small
 * `SqlConnection` seam the data store and the migration engine run their
 * queries through.
 */

use log::{debug, info};
use postgres::types::{ToSql as PgToSql, Type};
use postgres::NoTls;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use std::path::{Path, PathBuf};

use crate::app_config::{DatabaseConfig, DbDriver};
use crate::errors::{Result, StoreError};

/// A bound query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Int(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// A single column value read back from a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlCell {
    Null,
    Int(i64),
    Text(String),
}

/// One result row, in select-list order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlRow(pub Vec<SqlCell>);

impl SqlRow {
    /// Integer column, `None` when NULL
    pub fn opt_i64(&self, idx: usize) -> Result<Option<i64>> {
        match self.0.get(idx) {
            Some(SqlCell::Int(v)) => Ok(Some(*v)),
            Some(SqlCell::Null) => Ok(None),
            Some(SqlCell::Text(t)) => t
                .parse()
                .map(Some)
                .map_err(|_| StoreError::Storage(format!("column {} is not an integer", idx))),
            None => Err(StoreError::Storage(format!("column {} out of range", idx))),
        }
    }

    /// Text column, `None` when NULL
    pub fn opt_str(&self, idx: usize) -> Result<Option<&str>> {
        match self.0.get(idx) {
            Some(SqlCell::Text(t)) => Ok(Some(t.as_str())),
            Some(SqlCell::Null) => Ok(None),
            Some(SqlCell::Int(_)) => {
                Err(StoreError::Storage(format!("column {} is not text", idx)))
            }
            None => Err(StoreError::Storage(format!("column {} out of range", idx))),
        }
    }

    pub fn i64(&self, idx: usize) -> Result<i64> {
        self.opt_i64(idx)?
            .ok_or_else(|| StoreError::Storage(format!("column {} is NULL", idx)))
    }

    pub fn string(&self, idx: usize) -> Result<String> {
        Ok(self.opt_str(idx)?.unwrap_or_default().to_string())
    }
}

/// Minimal driver surface shared by the supported SQL engines
pub trait SqlConnection: Send {
    /// Run one or more statements without parameters
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Run a single parameterized statement, returning the affected row count
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Run a query and collect every row
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Row id generated by the most recent insert on this connection.
    ///
    /// Only meaningful for engines whose adapter reports
    /// `supports_last_insert_id`.
    fn last_insert_id(&mut self) -> Result<i64>;

    /// Run a query expected to yield at most one row
    fn query_opt(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<SqlRow>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

/// SQLite connection through rusqlite
pub struct SqliteConnection {
    /// Path to the database file
    db_path: PathBuf,
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (creating if needed) the database file at the given path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite database at {:?}", db_path);
        let conn = rusqlite::Connection::open(&db_path)?;

        Ok(Self { db_path, conn })
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");
        let conn = rusqlite::Connection::open_in_memory()?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl SqlConnection for SqliteConnection {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let affected = self
            .conn
            .execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let cell = match row.get_ref(idx)? {
                    ValueRef::Null => SqlCell::Null,
                    ValueRef::Integer(v) => SqlCell::Int(v),
                    ValueRef::Real(v) => SqlCell::Text(v.to_string()),
                    ValueRef::Text(t) | ValueRef::Blob(t) => {
                        SqlCell::Text(String::from_utf8_lossy(t).into_owned())
                    }
                };
                cells.push(cell);
            }
            result.push(SqlRow(cells));
        }

        Ok(result)
    }

    fn last_insert_id(&mut self) -> Result<i64> {
        Ok(self.conn.last_insert_rowid())
    }
}

/// PostgreSQL connection through the blocking postgres client
pub struct PostgresConnection {
    client: postgres::Client,
}

impl PostgresConnection {
    /// Connect using a `postgres://` URL or key/value connection string
    pub fn connect(connection_string: &str) -> Result<Self> {
        Self::connect_with(&connection_string.parse()?)
    }

    /// Connect using already separated connection parameters
    pub fn connect_with(config: &postgres::Config) -> Result<Self> {
        info!("Connecting to PostgreSQL at {:?}", config.get_hosts());
        let client = config.connect(NoTls)?;
        Ok(Self { client })
    }

    fn bind(params: &[SqlValue]) -> Vec<&(dyn PgToSql + Sync)> {
        params
            .iter()
            .map(|p| match p {
                SqlValue::Int(v) => v as &(dyn PgToSql + Sync),
                SqlValue::Text(s) => s as &(dyn PgToSql + Sync),
            })
            .collect()
    }

    fn cell(row: &postgres::Row, idx: usize) -> Result<SqlCell> {
        let ty = row.columns()[idx].type_().clone();
        let cell = if ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(idx)?.map(SqlCell::Int)
        } else if ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(idx)?
                .map(|v| SqlCell::Int(i64::from(v)))
        } else if ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(idx)?
                .map(|v| SqlCell::Int(i64::from(v)))
        } else {
            row.try_get::<_, Option<String>>(idx)?.map(SqlCell::Text)
        };
        Ok(cell.unwrap_or(SqlCell::Null))
    }
}

impl SqlConnection for PostgresConnection {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let bound = Self::bind(params);
        Ok(self.client.execute(sql, &bound)?)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let bound = Self::bind(params);
        let rows = self.client.query(sql, &bound)?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|idx| Self::cell(row, idx))
                    .collect::<Result<Vec<_>>>()
                    .map(SqlRow)
            })
            .collect()
    }

    fn last_insert_id(&mut self) -> Result<i64> {
        Err(StoreError::Storage(
            "PostgreSQL has no last insert id; use INSERT ... RETURNING".to_string(),
        ))
    }
}

/// Open a connection for the configured back-end
pub fn open(config: &DatabaseConfig) -> Result<Box<dyn SqlConnection>> {
    match config.driver()? {
        DbDriver::Sqlite3 => Ok(Box::new(SqliteConnection::open(&config.file)?)),
        DbDriver::Postgres => Ok(Box::new(PostgresConnection::connect_with(
            &config.postgres_config(),
        )?)),
    }
}
