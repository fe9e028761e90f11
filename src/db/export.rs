//! Export tasks to the pipe separated CSV interchange format.
//!
//! Rows come out in storage order. Seconds are dropped from the start and
//! stop times, so an export followed by an import rounds them to `:00`.

use super::Database;
use super::import::{CSV_HEADER, SEPARATOR};
use crate::error::{Error, Result};
use crate::types::Task;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Reject values the importer would read back into other columns.
/// The comment is the last column, so only a line break breaks it.
fn check_row(task: &Task, tags: &str) -> Result<()> {
    let breaks_row = |value: &str| value.contains(SEPARATOR) || value.contains('\n');
    let columns = [
        ("description", breaks_row(task.description())),
        ("project", breaks_row(task.project())),
        ("tags", breaks_row(tags)),
        ("comment", task.comment().contains('\n')),
    ];
    match columns.iter().find(|(_, broken)| *broken) {
        Some((column, _)) => Err(Error::csv_field(task.id(), column)),
        None => Ok(()),
    }
}

fn write_row<W: Write>(writer: &mut W, task: &Task) -> Result<()> {
    let tags = task.joined_tags();
    check_row(task, &tags)?;
    let start = task.schedule().broken_down_start();
    let stop = task.schedule().broken_down_stop();
    let fields = [
        start.date(),
        start.time(),
        stop.time(),
        task.description().to_string(),
        task.project().to_string(),
        tags,
        task.comment().to_string(),
    ];
    writeln!(writer, "{}", fields.join(SEPARATOR))?;
    Ok(())
}

impl Database {
    /// Write the header and every task to `writer`. Returns the number of rows written.
    ///
    /// A task whose fields cannot be written without breaking the row layout
    /// stops the export with a `CsvField` error.
    pub fn export_csv<W: Write>(&self, mut writer: W) -> Result<usize> {
        writeln!(writer, "{}", CSV_HEADER.join(SEPARATOR))?;

        let mut count = 0;
        let mut write_error = None;
        self.visit_all(|task: Task| match write_row(&mut writer, &task) {
            Ok(()) => {
                count += 1;
                true
            }
            Err(e) => {
                write_error = Some(e);
                false
            }
        })?;
        if let Some(e) = write_error {
            return Err(e);
        }

        writer.flush()?;
        info!(count, "Exported tasks");
        Ok(count)
    }

    /// Export to the file at `path`, replacing its content.
    pub fn export_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            Error::io(format!("Failed to open the file {}: {}", path.display(), e))
        })?;
        self.export_csv(BufWriter::new(file))
    }
}
