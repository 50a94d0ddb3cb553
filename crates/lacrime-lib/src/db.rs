//! SQLite-backed incident table.
//!
//! The store is rebuilt from a CSV file every time it is loaded: the header row
//! defines the column set, each column receives a storage affinity inferred from
//! its cells, and the table is dropped and recreated before the rows are
//! inserted. Once loaded the store is only ever read.
//!
//! Every filter value reaches SQLite as a bound parameter and every identifier
//! is quoted, so caller-supplied text can never change the shape of a query.
//! Substring filters use `instr`, which compares the full byte length of the
//! needle; `LIKE` would stop reading a pattern at an embedded NUL.
//!
//! Reads go through a fixed set of connections onto the same database, so a
//! long scan does not hold up other queries.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use csv::{ReaderBuilder, StringRecord};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Table name used when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "LA_Crime_Data";

/// Free-text crime category column in the cleaned LAPD extract.
pub const DEFAULT_DESCRIPTION_COLUMN: &str = "Crm Cd Desc";

/// Connections opened onto the loaded database when none is configured.
pub const DEFAULT_READ_CONNECTIONS: usize = 4;

static NEXT_MEMORY_DB: AtomicU64 = AtomicU64::new(0);

/// One incident row as an ordered field→value map, in table column order.
pub type IncidentRecord = Map<String, Value>;

/// Storage class chosen for a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAffinity {
    Integer,
    Real,
    Text,
}

impl ColumnAffinity {
    fn sql_type(self) -> &'static str {
        match self {
            ColumnAffinity::Integer => "INTEGER",
            ColumnAffinity::Real => "REAL",
            ColumnAffinity::Text => "TEXT",
        }
    }

    /// Narrowest affinity that still admits `cell`, given everything seen so far.
    fn widen(self, cell: &str) -> Self {
        match self {
            ColumnAffinity::Integer if cell.parse::<i64>().is_ok() => ColumnAffinity::Integer,
            ColumnAffinity::Integer | ColumnAffinity::Real if is_finite_real(cell) => {
                ColumnAffinity::Real
            }
            _ => ColumnAffinity::Text,
        }
    }

    fn convert(self, cell: &str) -> SqlValue {
        if cell.is_empty() {
            return SqlValue::Null;
        }
        match self {
            ColumnAffinity::Integer => cell
                .parse()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(cell.to_owned())),
            ColumnAffinity::Real => cell
                .parse()
                .map(SqlValue::Real)
                .unwrap_or_else(|_| SqlValue::Text(cell.to_owned())),
            ColumnAffinity::Text => SqlValue::Text(cell.to_owned()),
        }
    }
}

impl fmt::Display for ColumnAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

fn is_finite_real(cell: &str) -> bool {
    cell.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// A column of the incident table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub affinity: ColumnAffinity,
}

/// Knobs for building an [`IncidentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Name of the table the CSV is loaded into.
    pub table_name: String,
    /// Column searched by keyword filters. Must exist in the CSV header.
    pub description_column: String,
    /// Optional on-disk SQLite file. `None` keeps the table in memory.
    pub database_path: Option<PathBuf>,
    /// Size of the read connection set. Values below 1 are treated as 1.
    pub read_connections: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            database_path: None,
            read_connections: DEFAULT_READ_CONNECTIONS,
        }
    }
}

impl StoreOptions {
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_description_column(mut self, column: impl Into<String>) -> Self {
        self.description_column = column.into();
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_read_connections(mut self, count: usize) -> Self {
        self.read_connections = count.max(1);
        self
    }
}

/// Where the incident table lives.
#[derive(Debug, Clone)]
enum DatabaseTarget {
    /// Named in-memory database shared by every connection that opens the URI.
    SharedMemory(String),
    File(PathBuf),
}

impl DatabaseTarget {
    fn new(path: Option<&Path>) -> Self {
        match path {
            Some(path) => DatabaseTarget::File(path.to_path_buf()),
            None => {
                let id = NEXT_MEMORY_DB.fetch_add(1, Ordering::Relaxed);
                DatabaseTarget::SharedMemory(format!(
                    "file:lacrime-{}-{id}?mode=memory&cache=shared",
                    std::process::id()
                ))
            }
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        match self {
            DatabaseTarget::SharedMemory(uri) => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
            DatabaseTarget::File(path) => Connection::open(path),
        }
    }
}

/// Fixed set of connections onto one database, handed out to readers.
///
/// A shared in-memory database only lives while one of its connections is
/// open, so the set is never empty and never shrinks.
struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// Keep the connection that loaded the table and open `size - 1` more.
    fn open(loader: Connection, target: &DatabaseTarget, size: usize) -> Result<Self> {
        let mut connections = Vec::with_capacity(size.max(1));
        connections.push(Mutex::new(loader));
        for _ in 1..size {
            connections.push(Mutex::new(target.open()?));
        }
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    fn len(&self) -> usize {
        self.connections.len()
    }

    /// Take the first idle connection, starting from a rotating offset. When
    /// every connection is busy, wait on the one at the offset.
    fn acquire(&self) -> Result<MutexGuard<'_, Connection>> {
        let len = self.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;
        for offset in 0..len {
            match self.connections[(start + offset) % len].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(Error::StoreUnavailable),
            }
        }
        self.connections[start]
            .lock()
            .map_err(|_| Error::StoreUnavailable)
    }
}

/// Queryable incident table rebuilt from a CSV file.
pub struct IncidentStore {
    pool: ReadPool,
    table: String,
    select_list: String,
    columns: Vec<Column>,
    description_column: String,
    row_count: usize,
}

impl IncidentStore {
    /// Load the CSV at `csv_path`, replacing any previous table contents.
    pub fn load(csv_path: &Path, options: StoreOptions) -> Result<Self> {
        if !csv_path.exists() {
            return Err(Error::DatasetNotFound {
                path: csv_path.to_path_buf(),
            });
        }

        debug!(path = %csv_path.display(), table = %options.table_name, "loading incident csv");
        let file = fs::File::open(csv_path)?;
        Self::from_reader(file, options)
    }

    /// Load incidents from any CSV reader (e.g., a file or an in-memory buffer).
    pub fn from_reader<R: Read>(reader: R, options: StoreOptions) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().from_reader(reader);
        let names = column_names_from_header(csv_reader.headers()?)?;

        if !names.iter().any(|name| *name == options.description_column) {
            return Err(Error::MissingColumn {
                column: options.description_column,
                available: names,
            });
        }

        let records = csv_reader
            .records()
            .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;
        let columns = infer_columns(names, &records);

        let target = DatabaseTarget::new(options.database_path.as_deref());
        let mut loader = target.open()?;
        let table = quote_identifier(&options.table_name);
        replace_table(&mut loader, &table, &columns, &records)?;
        let pool = ReadPool::open(loader, &target, options.read_connections)?;

        info!(
            table = %options.table_name,
            rows = records.len(),
            columns = columns.len(),
            readers = pool.len(),
            "incident table rebuilt"
        );

        let select_list = columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            pool,
            table,
            select_list,
            columns,
            description_column: options.description_column,
            row_count: records.len(),
        })
    }

    /// Columns in CSV header order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Name of the column keyword filters run against.
    pub fn description_column(&self) -> &str {
        &self.description_column
    }

    /// Number of rows loaded from the CSV.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Every record, in file order.
    pub fn query_all(&self) -> Result<Vec<IncidentRecord>> {
        let sql = format!(
            "SELECT {cols} FROM {table} ORDER BY _rowid_",
            cols = self.select_list,
            table = self.table
        );
        self.select(&sql, &[])
    }

    /// Records whose `column` contains `pattern`, ignoring ASCII case.
    ///
    /// `pattern` is matched byte for byte: `%`, `_`, quotes and NUL carry no
    /// special meaning. An empty pattern matches every non-null value.
    pub fn query_like(&self, column: &str, pattern: &str) -> Result<Vec<IncidentRecord>> {
        let column = self.quoted_column(column)?;
        let sql = format!(
            "SELECT {cols} FROM {table} WHERE {cond} ORDER BY _rowid_",
            cols = self.select_list,
            table = self.table,
            cond = contains_clause(&column, 1),
        );
        self.select(&sql, &[pattern.to_string()])
    }

    /// Records whose `column` contains none of `patterns`.
    ///
    /// Rows where `column` is NULL are excluded whenever at least one pattern is
    /// given, matching SQL three-valued logic.
    pub fn query_not_like<S: AsRef<str>>(
        &self,
        column: &str,
        patterns: &[S],
    ) -> Result<Vec<IncidentRecord>> {
        let column = self.quoted_column(column)?;
        let mut sql = format!(
            "SELECT {cols} FROM {table}",
            cols = self.select_list,
            table = self.table
        );

        let clauses: Vec<String> = (1..=patterns.len())
            .map(|i| format!("NOT ({})", contains_clause(&column, i)))
            .collect();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY _rowid_");

        let params: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        self.select(&sql, &params)
    }

    fn quoted_column(&self, name: &str) -> Result<String> {
        if self.columns.iter().any(|c| c.name == name) {
            Ok(quote_identifier(name))
        } else {
            Err(Error::MissingColumn {
                column: name.to_string(),
                available: self.columns.iter().map(|c| c.name.clone()).collect(),
            })
        }
    }

    /// Check that the table is readable.
    ///
    /// Busy connections count as healthy; a poisoned one does not. Never waits
    /// on a lock.
    pub fn ping(&self) -> Result<()> {
        let mut idle = None;
        for connection in &self.pool.connections {
            match connection.try_lock() {
                Ok(guard) => {
                    if idle.is_none() {
                        idle = Some(guard);
                    }
                }
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Poisoned(_)) => return Err(Error::StoreUnavailable),
            }
        }

        if let Some(connection) = idle {
            let sql = format!("SELECT 1 FROM {} LIMIT 1", self.table);
            connection.prepare(&sql)?.exists([])?;
        }
        Ok(())
    }

    fn select(&self, sql: &str, params: &[String]) -> Result<Vec<IncidentRecord>> {
        let connection = self.pool.acquire()?;
        let mut stmt = connection.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            self.row_to_record(row)
        })?;

        let mut records = Vec::new();
        for entry in rows {
            records.push(entry?);
        }
        Ok(records)
    }

    fn row_to_record(&self, row: &Row<'_>) -> rusqlite::Result<IncidentRecord> {
        let mut record = Map::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter().enumerate() {
            record.insert(column.name.clone(), value_to_json(row.get_ref(idx)?));
        }
        Ok(record)
    }
}

impl fmt::Debug for IncidentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidentStore")
            .field("table", &self.table)
            .field("columns", &self.columns.len())
            .field("row_count", &self.row_count)
            .field("description_column", &self.description_column)
            .field("read_connections", &self.pool.len())
            .finish()
    }
}

/// Quote an SQLite identifier, doubling any embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Condition true when the quoted `column` contains parameter `?{param}`,
/// ignoring ASCII case.
fn contains_clause(column: &str, param: usize) -> String {
    format!("instr(upper({column}), upper(?{param})) > 0")
}

fn column_names_from_header(headers: &StringRecord) -> Result<Vec<String>> {
    if headers.is_empty() {
        return Err(Error::InvalidDataset {
            message: "missing header row".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        // pandas writes its index column with a blank header
        let name = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.to_string()
        };
        if !seen.insert(name.clone()) {
            return Err(Error::InvalidDataset {
                message: format!("duplicate column name '{name}'"),
            });
        }
        names.push(name);
    }
    Ok(names)
}

fn infer_columns(names: Vec<String>, records: &[StringRecord]) -> Vec<Column> {
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut affinity = ColumnAffinity::Integer;
            let mut saw_value = false;
            for cell in records.iter().filter_map(|r| r.get(idx)) {
                if cell.is_empty() {
                    continue;
                }
                saw_value = true;
                affinity = affinity.widen(cell);
                if affinity == ColumnAffinity::Text {
                    break;
                }
            }
            Column {
                name,
                affinity: if saw_value {
                    affinity
                } else {
                    ColumnAffinity::Text
                },
            }
        })
        .collect()
}

fn replace_table(
    connection: &mut Connection,
    table: &str,
    columns: &[Column],
    records: &[StringRecord],
) -> Result<()> {
    let column_defs = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.affinity))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = connection.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    tx.execute(&format!("CREATE TABLE {table} ({column_defs})"), [])?;
    {
        let mut insert = tx.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
        for record in records {
            let values = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| column.affinity.convert(cell));
            insert.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
