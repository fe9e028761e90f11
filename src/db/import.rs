//! Import tasks from the pipe separated CSV interchange format.
//!
//! The first line is a header naming the columns of [`CSV_HEADER`], in that
//! order. Each following non-empty line holds one task; the day is given
//! once and the start and stop columns are `HH:MM` clock times.
//!
//! An import runs in a single transaction: either every row is stored or
//! none is.

use super::Database;
use super::tasks::{delete_all, insert_task};
use crate::error::{Error, ErrorCode, Result};
use crate::text::{normalize_date, normalize_time};
use crate::types::{Task, TaskSchedule};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Column separator.
pub const SEPARATOR: &str = "|";

/// Interchange columns, in order.
pub const CSV_HEADER: [&str; 7] = [
    "task_date",
    "task_start",
    "task_stop",
    "task_description",
    "task_project",
    "task_tags",
    "task_comment",
];

/// What to do with the tasks already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep existing tasks and add the imported ones.
    #[default]
    Append,
    /// Delete every existing task first, in the same transaction.
    Replace,
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn check_header(line: &str) -> Result<()> {
    let mut found = line.split(SEPARATOR);
    for expected in CSV_HEADER {
        match found.next() {
            Some(column) if column == expected => {}
            Some(column) => {
                return Err(Error::csv_header(format!(
                    "Import failed: Expected column {} but found column {}",
                    expected, column
                )));
            }
            None => {
                return Err(Error::csv_header("Import failed: Unexpected end of line"));
            }
        }
    }
    if let Some(column) = found.next() {
        return Err(Error::csv_header(format!(
            "Import failed: Unexpected column {}",
            column
        )));
    }
    Ok(())
}

/// Parse one data row. The comment column takes the rest of the line.
/// Day and clock columns may omit leading zeros (`2022-4-20`, `9:00`).
fn parse_row(line: &str) -> Result<Task> {
    let fields: Vec<&str> = line.splitn(CSV_HEADER.len(), SEPARATOR).collect();
    let [date, start, stop, description, project, tags, comment] = fields[..] else {
        return Err(Error::new(ErrorCode::CsvRow, "Unexpected end of line"));
    };
    let schedule = TaskSchedule::from_day(
        &normalize_date(date)?,
        &normalize_time(start)?,
        &normalize_time(stop)?,
    )?;
    Task::new(schedule, project, description, tags, comment)
}

fn import_rows<R: BufRead>(conn: &Connection, reader: R) -> Result<usize> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(Error::csv_header("Import failed: missing header")),
    };
    check_header(strip_line_ending(&header))?;

    let mut count = 0;
    for line in lines {
        let line = line?;
        let line = strip_line_ending(&line);
        if line.trim().is_empty() {
            continue;
        }
        let task = parse_row(line).map_err(|e| Error::csv_row(line, e))?;
        insert_task(conn, &task).map_err(|e| Error::csv_row(line, e))?;
        count += 1;
    }
    Ok(count)
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        Error::io(format!("Failed to open the file {}: {}", path.display(), e))
    })?;
    Ok(BufReader::new(file))
}

impl Database {
    /// Import CSV lines on top of the existing tasks. Returns the number of rows stored.
    pub fn import_csv<R: BufRead>(&self, reader: R) -> Result<usize> {
        self.import_csv_with(reader, ImportMode::Append)
    }

    /// Import CSV lines with the given mode. Returns the number of rows stored.
    pub fn import_csv_with<R: BufRead>(&self, reader: R, mode: ImportMode) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if mode == ImportMode::Replace {
                let removed = delete_all(&tx)?;
                info!(removed, "Cleared tasks before import");
            }
            let count = import_rows(&tx, reader)?;
            tx.commit()?;
            info!(count, "Imported tasks");
            Ok(count)
        })
    }

    /// Import the CSV file at `path` on top of the existing tasks.
    pub fn import_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        self.import_csv_file_with(path, ImportMode::Append)
    }

    /// Import the CSV file at `path` with the given mode.
    pub fn import_csv_file_with<P: AsRef<Path>>(&self, path: P, mode: ImportMode) -> Result<usize> {
        let reader = open_file(path.as_ref())?;
        self.import_csv_with(reader, mode)
    }
}
