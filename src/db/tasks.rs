//! Task CRUD, finders and visitors.

use super::{Database, FromTaskRow, Query};
use crate::error::{Error, Result};
use crate::types::{PROPERTY_ID, Task, TaskId};
use rusqlite::{Connection, Params, params};
use serde_json::Value;
use tracing::warn;

// =============================================================================
// Connection-level helpers, shared with the CSV importer's transaction
// =============================================================================

pub(super) fn insert_task(conn: &Connection, task: &Task) -> Result<TaskId> {
    let mut stmt = conn.prepare_cached(Query::Insert.sql())?;
    stmt.execute(params![
        task.start(),
        task.stop(),
        task.project(),
        task.description(),
        task.joined_tags(),
        task.comment(),
    ])?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn delete_all(conn: &Connection) -> Result<usize> {
    let mut stmt = conn.prepare_cached(Query::DeleteAll.sql())?;
    Ok(stmt.execute([])?)
}

fn find_one<T, P>(conn: &Connection, query: Query, params: P) -> Result<Option<T>>
where
    T: FromTaskRow,
    P: Params,
{
    let mut stmt = conn.prepare_cached(query.sql())?;
    let result = stmt.query_row(params, T::from_task_row);

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn visit_rows<T, P, F>(conn: &Connection, query: Query, params: P, mut visitor: F) -> Result<()>
where
    T: FromTaskRow,
    P: Params,
    F: FnMut(T) -> bool,
{
    let mut stmt = conn.prepare_cached(query.sql())?;
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        if !visitor(T::from_task_row(row)?) {
            break;
        }
    }
    Ok(())
}

fn day_pattern(day: &str) -> String {
    format!("{}%", day)
}

impl Database {
    /// Insert a new task and return the id the store assigned to it.
    pub fn insert(&self, task: &Task) -> Result<TaskId> {
        self.with_conn(|conn| insert_task(conn, task))
    }

    /// Insert a task given as a JSON object. Any `id` property is ignored.
    pub fn insert_json(&self, value: &Value) -> Result<TaskId> {
        let task = Task::from_json(value)?;
        self.insert(&task)
    }

    /// Replace every field of the stored task carrying `task.id()`.
    pub fn update(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(Query::Update.sql())?;
            let changed = stmt.execute(params![
                task.start(),
                task.stop(),
                task.project(),
                task.description(),
                task.joined_tags(),
                task.comment(),
                task.id(),
            ])?;
            if changed == 0 {
                warn!(id = task.id(), "Update did not match any task");
            }
            Ok(())
        })
    }

    /// Update from a JSON object, which must carry an `id`.
    pub fn update_json(&self, value: &Value) -> Result<()> {
        if value.get(PROPERTY_ID).is_none() {
            return Err(Error::missing_property(PROPERTY_ID));
        }
        let task = Task::from_json(value)?;
        self.update(&task)
    }

    pub fn delete_by_id(&self, id: TaskId) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(Query::DeleteById.sql())?;
            if stmt.execute(params![id])? == 0 {
                warn!(id, "Delete did not match any task");
            }
            Ok(())
        })
    }

    /// Remove every task.
    pub fn delete_all(&self) -> Result<()> {
        self.with_conn(|conn| delete_all(conn).map(|_| ()))
    }

    /// Number of stored tasks.
    pub fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(Query::Count.sql())?;
            let count: i64 = stmt.query_row([], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
    }

    /// Find a task by id, as a [`Task`] or as a JSON object.
    pub fn find_by_id<T: FromTaskRow>(&self, id: TaskId) -> Result<Option<T>> {
        self.with_conn(|conn| find_one(conn, Query::FindById, params![id]))
    }

    /// The task with the greatest stop time.
    pub fn find_latest(&self) -> Result<Option<Task>> {
        self.with_conn(|conn| find_one(conn, Query::FindLatest, params![1_i64]))
    }

    /// Visit up to `count` tasks, latest stop time first.
    pub fn visit_n_latest<F>(&self, count: i64, visitor: F) -> Result<()>
    where
        F: FnMut(Task) -> bool,
    {
        if count <= 0 {
            return Err(Error::invalid_count(count));
        }
        self.with_conn(|conn| visit_rows(conn, Query::FindLatest, params![count], visitor))
    }

    /// Latest task whose stop time falls on `day` (`YYYY-MM-DD`).
    pub fn find_latest_for_day(&self, day: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            find_one(conn, Query::FindLatestForDay, params![day_pattern(day)])
        })
    }

    /// Visit tasks whose stop time falls on `day` (`YYYY-MM-DD`), earliest first.
    ///
    /// A task running over midnight belongs to the day it stops on.
    pub fn visit_for_day<T, F>(&self, day: &str, visitor: F) -> Result<()>
    where
        T: FromTaskRow,
        F: FnMut(T) -> bool,
    {
        self.with_conn(|conn| {
            visit_rows(conn, Query::FindForDay, params![day_pattern(day)], visitor)
        })
    }

    /// A task whose `[start, stop]` range contains the instant `at`
    /// (`YYYY-MM-DD HH:MM` or with seconds).
    pub fn find_at(&self, at: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| find_one(conn, Query::FindAt, params![at]))
    }

    /// Visit tasks whose description contains `substr`, latest first.
    pub fn visit_from_description<F>(&self, substr: &str, visitor: F) -> Result<()>
    where
        F: FnMut(Task) -> bool,
    {
        let pattern = format!("%{}%", substr);
        self.with_conn(|conn| visit_rows(conn, Query::FindFromDescription, params![pattern], visitor))
    }

    /// Visit every task, in no particular order.
    pub fn visit_all<T, F>(&self, visitor: F) -> Result<()>
    where
        T: FromTaskRow,
        F: FnMut(T) -> bool,
    {
        self.with_conn(|conn| visit_rows(conn, Query::SelectAll, [], visitor))
    }
}
