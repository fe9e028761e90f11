//! Task store backed by SQLite.
//!
//! Every statement the store runs is listed in [`Query`] and compiled once by
//! [`Database::init`] into the connection's prepared statement cache. Each
//! execution borrows its statement from the cache; on drop the statement is
//! reset and its bindings cleared before it goes back.

pub mod export;
pub mod import;
mod tasks;

use crate::error::{Error, Result};
use crate::types::{
    PROPERTY_COMMENT, PROPERTY_DESCRIPTION, PROPERTY_ID, PROPERTY_PROJECT, PROPERTY_START,
    PROPERTY_STOP, PROPERTY_TAGS, Task, TaskSchedule, tags_from_string,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE tasks (
    task_id INTEGER PRIMARY KEY,
    task_start TEXT NOT NULL CHECK (task_start <> ''),
    task_stop TEXT NOT NULL CHECK (task_stop <> ''),
    task_project TEXT NOT NULL CHECK (task_project <> ''),
    task_description TEXT NOT NULL CHECK (task_description <> ''),
    task_tags TEXT,
    task_comment TEXT
)";

macro_rules! select_tasks {
    ($suffix:literal) => {
        concat!(
            "SELECT task_id, task_start, task_stop, task_project, task_description, ",
            "task_tags, task_comment FROM tasks ",
            $suffix
        )
    };
}

/// Statement catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Insert,
    Update,
    DeleteById,
    DeleteAll,
    Count,
    SelectAll,
    FindById,
    FindLatest,
    FindLatestForDay,
    FindForDay,
    FindFromDescription,
    FindAt,
}

impl Query {
    pub const ALL: [Query; 12] = [
        Query::Insert,
        Query::Update,
        Query::DeleteById,
        Query::DeleteAll,
        Query::Count,
        Query::SelectAll,
        Query::FindById,
        Query::FindLatest,
        Query::FindLatestForDay,
        Query::FindForDay,
        Query::FindFromDescription,
        Query::FindAt,
    ];

    pub fn sql(self) -> &'static str {
        match self {
            Query::Insert => {
                "INSERT INTO tasks (task_start, task_stop, task_project, task_description, \
                 task_tags, task_comment) VALUES (?, ?, ?, ?, ?, ?)"
            }
            Query::Update => {
                "UPDATE tasks SET task_start = ?, task_stop = ?, task_project = ?, \
                 task_description = ?, task_tags = ?, task_comment = ? WHERE task_id = ?"
            }
            Query::DeleteById => "DELETE FROM tasks WHERE task_id = ?",
            Query::DeleteAll => "DELETE FROM tasks",
            Query::Count => "SELECT COUNT(*) FROM tasks",
            Query::SelectAll => select_tasks!(""),
            Query::FindById => select_tasks!("WHERE task_id = ?"),
            Query::FindLatest => select_tasks!("ORDER BY DATETIME(task_stop) DESC LIMIT ?"),
            Query::FindLatestForDay => select_tasks!(
                "WHERE task_stop LIKE ? ORDER BY DATETIME(task_stop) DESC LIMIT 1"
            ),
            Query::FindForDay => {
                select_tasks!("WHERE task_stop LIKE ? ORDER BY DATETIME(task_stop) ASC")
            }
            Query::FindFromDescription => {
                select_tasks!("WHERE task_description LIKE ? ORDER BY DATETIME(task_stop) DESC")
            }
            Query::FindAt => select_tasks!(
                "WHERE DATETIME(?) BETWEEN DATETIME(task_start) AND DATETIME(task_stop)"
            ),
        }
    }
}

/// Builds a result value from one `tasks` row.
///
/// Columns are in catalog order: id, start, stop, project, description,
/// tags, comment.
pub trait FromTaskRow: Sized {
    fn from_task_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

fn conversion_error(column: usize, err: Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

impl FromTaskRow for Task {
    fn from_task_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id: i64 = row.get(0)?;
        let start: String = row.get(1)?;
        let stop: String = row.get(2)?;
        let project: String = row.get(3)?;
        let description: String = row.get(4)?;
        let tags: Option<String> = row.get(5)?;
        let comment: Option<String> = row.get(6)?;

        let schedule = TaskSchedule::new(start, stop).map_err(|e| conversion_error(1, e))?;
        let task = Task::new(
            schedule,
            project,
            description,
            tags.as_deref().unwrap_or_default(),
            comment.unwrap_or_default(),
        )
        .map_err(|e| conversion_error(3, e))?;
        Ok(task.with_id(id))
    }
}

/// JSON rows are built straight from the columns, without validating the schedule.
impl FromTaskRow for Value {
    fn from_task_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id: i64 = row.get(0)?;
        let start: String = row.get(1)?;
        let stop: String = row.get(2)?;
        let project: String = row.get(3)?;
        let description: String = row.get(4)?;
        let tags: Option<String> = row.get(5)?;
        let comment: Option<String> = row.get(6)?;

        let tags: Vec<String> = tags_from_string(tags.as_deref().unwrap_or_default())
            .into_iter()
            .collect();
        let mut object = serde_json::Map::new();
        object.insert(PROPERTY_ID.into(), json!(id));
        object.insert(PROPERTY_START.into(), json!(start));
        object.insert(PROPERTY_STOP.into(), json!(stop));
        object.insert(PROPERTY_PROJECT.into(), json!(project));
        object.insert(PROPERTY_DESCRIPTION.into(), json!(description));
        object.insert(PROPERTY_TAGS.into(), json!(tags));
        object.insert(PROPERTY_COMMENT.into(), json!(comment.unwrap_or_default()));
        Ok(Value::Object(object))
    }
}

/// Database handle wrapping a SQLite connection.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    path: Option<PathBuf>,
    existed: bool,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl Database {
    /// Create a closed handle. An empty path selects an in-memory database.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Self::in_memory();
        }
        Self {
            path: Some(path.to_path_buf()),
            existed: path.exists(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a closed handle on an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            existed: false,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Open, create the schema and prepare the catalog in one go.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Self::new(path);
        db.open()?;
        db.init()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::in_memory();
        db.open()?;
        db.init()?;
        Ok(db)
    }

    /// Storage file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Open the underlying connection.
    pub fn open(&self) -> Result<()> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Err(Error::already_open());
        }
        let conn = match &self.path {
            Some(path) => {
                info!("Database path: {}", path.display());
                Connection::open(path)
            }
            None => {
                info!("In memory database");
                Connection::open_in_memory()
            }
        }
        .map_err(Error::open)?;
        *guard = Some(conn);
        Ok(())
    }

    /// Create the schema when the database is new, then prepare every catalog statement.
    pub fn init(&self) -> Result<()> {
        let existed = self.existed;
        self.with_conn(|conn| {
            if !existed {
                conn.execute_batch(SCHEMA).map_err(Error::schema)?;
                info!("Created table tasks");
            }
            conn.set_prepared_statement_cache_capacity(Query::ALL.len());
            for query in Query::ALL {
                conn.prepare_cached(query.sql()).map_err(Error::prepare)?;
                debug!(?query, "Prepared statement");
            }
            Ok(())
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or_else(Error::not_open)?;
        f(conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or_else(Error::not_open)?;
        f(conn)
    }
}
