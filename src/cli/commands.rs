//! One-shot commands: version, CSV import and export, tail and delete.

use super::entry::Prompter;
use crate::db::Database;
use crate::db::import::ImportMode;
use crate::text::normalize_date_time;
use crate::types::{Task, TaskId};
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::Path;

/// Print the version banner.
pub fn version<W: Write>(out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{} version {} ({}) [{}]",
        crate::NAME,
        crate::VERSION,
        crate::build_type(),
        crate::GIT_HASH
    )?;
    writeln!(out, "* SQLite version: {}", rusqlite::version())?;
    Ok(())
}

/// Replace every stored task with the content of a CSV file.
pub fn import<W: Write>(db: &Database, path: &Path, out: &mut W) -> Result<usize> {
    let count = db.import_csv_file_with(path, ImportMode::Replace)?;
    writeln!(out, "Imported {} entries", count)?;
    Ok(count)
}

/// Write every stored task to a CSV file.
pub fn export<W: Write>(db: &Database, path: &Path, out: &mut W) -> Result<usize> {
    let count = db.export_csv_file(path)?;
    writeln!(out, "Exported {} entries", count)?;
    Ok(count)
}

/// Print the `count` latest tasks, latest first.
pub fn tail<W: Write>(db: &Database, count: i64, out: &mut W) -> Result<()> {
    let mut write_error = None;
    db.visit_n_latest(count, |task| match writeln!(out, "{}", task) {
        Ok(()) => true,
        Err(e) => {
            write_error = Some(e);
            false
        }
    })?;
    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// `target` is a task id, or a date-time when it contains `-`, `:` or `.`.
fn find_target(db: &Database, target: &str) -> Result<Option<Task>> {
    if target.contains(['-', ':', '.']) {
        let at = normalize_date_time(target)?;
        Ok(db.find_at(&at)?)
    } else {
        let id: TaskId = target
            .parse()
            .with_context(|| format!("Invalid task id: {}", target))?;
        Ok(db.find_by_id(id)?)
    }
}

/// Show the matching task and delete it once confirmed.
pub fn delete<R: BufRead, W: Write>(
    db: &Database,
    target: &str,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Some(task) = find_target(db, target)? else {
        bail!("No task found matching '{}'", target);
    };
    prompter.say("Delete the following task ?")?;
    prompter.say(format!("\t{}", task))?;
    let decision = prompter.ask("[y/n]")?;
    if !decision.eq_ignore_ascii_case("y") {
        bail!("Task not deleted.");
    }
    db.delete_by_id(task.id())?;
    prompter.say("Task deleted.")?;
    Ok(())
}
