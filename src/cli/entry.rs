//! Interactive entry of a new task.

use crate::db::Database;
use crate::text::{normalize_date, normalize_time};
use crate::types::{DATE_FORMAT, TIME_FORMAT, Task, TaskSchedule};
use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime};
use std::fmt::Display;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Line oriented question and answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    /// Prompt on the terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message: ` and return the trimmed answer.
    pub fn ask(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}: ", message)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("End of input");
        }
        Ok(crate::text::trim(&line).to_string())
    }

    /// Print one line.
    pub fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

fn with_default(prompt: &str, default: Option<&str>) -> String {
    match default {
        Some(value) => format!("{} [{}]", prompt, value),
        None => prompt.to_string(),
    }
}

/// Ask for a day until a valid one (or the default) is given.
fn read_date<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    prompt: &str,
    default: Option<&str>,
) -> Result<String> {
    let message = with_default(prompt, default);
    loop {
        let value = prompter.ask(&message)?;
        if value.is_empty() {
            if let Some(default) = default {
                return Ok(default.to_string());
            }
            continue;
        }
        match normalize_date(&value) {
            Ok(date) if NaiveDate::parse_from_str(&date, DATE_FORMAT).is_ok() => return Ok(date),
            Ok(_) => prompter.say("Invalid date. Please enter a date like '2020-01-31'")?,
            Err(e) => prompter.say(e)?,
        }
    }
}

/// Ask for a clock time until a valid one (or the default) is given.
fn read_time<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    prompt: &str,
    default: Option<&str>,
) -> Result<String> {
    let message = with_default(prompt, default);
    loop {
        let value = prompter.ask(&message)?;
        if value.is_empty() {
            if let Some(default) = default {
                return Ok(default.to_string());
            }
            continue;
        }
        match normalize_time(&value) {
            Ok(time) if NaiveTime::parse_from_str(&time, TIME_FORMAT).is_ok() => return Ok(time),
            Ok(_) => prompter.say("Invalid time. Please enter a time like '9:50' or '17.30'")?,
            Err(e) => prompter.say(e)?,
        }
    }
}

fn projects_prompt(projects: &[String]) -> String {
    let mut entries: Vec<String> = projects
        .iter()
        .enumerate()
        .map(|(i, project)| format!("{} -> {}", i + 1, project))
        .collect();
    entries.push("other".to_string());
    format!("* Project [{}]", entries.join(", "))
}

/// A favourite by its number, or any other name.
fn read_project<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    projects: &[String],
) -> Result<String> {
    let message = projects_prompt(projects);
    loop {
        let choice = prompter.ask(&message)?;
        if choice.is_empty() {
            prompter.say("\tThe project must be entered")?;
            continue;
        }
        match choice.parse::<i64>() {
            Ok(n) if n >= 1 && (n as usize) <= projects.len() => {
                return Ok(projects[n as usize - 1].clone());
            }
            Ok(_) => prompter.say("\tEnter a project number or the name of the project")?,
            Err(_) => return Ok(choice),
        }
    }
}

fn read_required<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    prompt: &str,
    missing: &str,
) -> Result<String> {
    loop {
        let value = prompter.ask(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        prompter.say(missing)?;
    }
}

/// Latest task whose description contains `text`, if the user confirms it.
fn find_resumed<R: BufRead, W: Write>(
    db: &Database,
    prompter: &mut Prompter<R, W>,
    text: &str,
) -> Result<Option<Task>> {
    let mut found = None;
    db.visit_from_description(text, |task| {
        found = Some(task);
        false
    })?;
    let Some(task) = found else {
        prompter.say(format!("No task found matching '{}'", text))?;
        return Ok(None);
    };
    let answer = prompter.ask(&format!(
        "Resuming [{}] \"{}\" ? [Y/n]",
        task.project(),
        task.description()
    ))?;
    if answer.eq_ignore_ascii_case("n") {
        return Ok(None);
    }
    Ok(Some(task))
}

/// Walk the user through a new task, store it and return it with its id.
///
/// `today` (`YYYY-MM-DD`) is the default day. With `resume`, the project,
/// description and tags are copied from the latest matching task.
pub fn run<R: BufRead, W: Write>(
    db: &Database,
    prompter: &mut Prompter<R, W>,
    projects: &[String],
    resume: Option<&str>,
    today: &str,
) -> Result<Task> {
    let resumed = match resume {
        Some(text) => find_resumed(db, prompter, text)?,
        None => None,
    };

    let date = read_date(prompter, "* Date", Some(today))?;

    let default_start = db
        .find_latest_for_day(&date)?
        .map(|latest| latest.schedule().broken_down_stop().time());
    let start = read_time(prompter, "* Start time", default_start.as_deref())?;
    let stop = read_time(prompter, "* Stop time", None)?;
    let schedule = TaskSchedule::from_day(&date, &start, &stop)?;

    let (project, description, tags) = match &resumed {
        Some(task) => {
            prompter.say(format!("* Project: {}", task.project()))?;
            prompter.say(format!("* Description: {}", task.description()))?;
            prompter.say(format!("  Tags: {}", task.joined_tags()))?;
            (
                task.project().to_string(),
                task.description().to_string(),
                task.joined_tags(),
            )
        }
        None => {
            let project = read_project(prompter, projects)?;
            let description =
                read_required(prompter, "* Description", "\tThe description must be entered")?;
            let tags = prompter.ask("  Tags (separated by ,)")?;
            (project, description, tags)
        }
    };
    let comment = prompter.ask("  Comment")?;

    let task = Task::new(schedule, project, description, &tags, comment)?;
    let id = db.insert(&task)?;
    let task = task.with_id(id);
    prompter.say(&task)?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(script: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    fn output(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_output()).unwrap()
    }

    fn projects() -> Vec<String> {
        vec!["Admin".to_string(), "Support".to_string()]
    }

    #[test]
    fn ask_trims_and_fails_at_end_of_input() {
        let mut p = prompter("  hello \n");
        assert_eq!(p.ask("Q").unwrap(), "hello");
        assert!(p.ask("Q").is_err());
        assert_eq!(output(p), "Q: Q: ");
    }

    #[test]
    fn date_defaults_and_normalizes() {
        let mut p = prompter("\n");
        assert_eq!(read_date(&mut p, "* Date", Some("2022-04-20")).unwrap(), "2022-04-20");

        let mut p = prompter("2022.4.2\n");
        assert_eq!(read_date(&mut p, "* Date", None).unwrap(), "2022-04-02");
    }

    #[test]
    fn invalid_date_prompts_again() {
        let mut p = prompter("2022-02-30\nyesterday\n2022-02-28\n");
        assert_eq!(read_date(&mut p, "* Date", None).unwrap(), "2022-02-28");
        let out = output(p);
        assert!(out.contains("Invalid date. Please enter a date like '2020-01-31'"));
        assert!(out.contains("Unknown date format: yesterday"));
    }

    #[test]
    fn invalid_time_prompts_again() {
        let mut p = prompter("25:00\n9.5\n");
        assert_eq!(read_time(&mut p, "* Stop time", None).unwrap(), "09:05");
        assert!(output(p).contains("Invalid time. Please enter a time like '9:50' or '17.30'"));
    }

    #[test]
    fn project_by_number_or_name() {
        let mut p = prompter("2\n");
        assert_eq!(read_project(&mut p, &projects()).unwrap(), "Support");

        let mut p = prompter("Research\n");
        assert_eq!(read_project(&mut p, &projects()).unwrap(), "Research");

        let mut p = prompter("\n3\n1\n");
        assert_eq!(read_project(&mut p, &projects()).unwrap(), "Admin");
        let out = output(p);
        assert!(out.starts_with("* Project [1 -> Admin, 2 -> Support, other]: "));
        assert!(out.contains("The project must be entered"));
        assert!(out.contains("Enter a project number or the name of the project"));
    }

    #[test]
    fn new_task_is_stored() {
        let db = Database::open_in_memory().unwrap();
        let mut p = prompter("\n9:00\n10.30\n1\ncode cleanup\ndev, refactoring\nmy comment\n");
        let task = run(&db, &mut p, &projects(), None, "2022-04-20").unwrap();

        assert_eq!(task.id(), 1);
        assert_eq!(task.start(), "2022-04-20 09:00:00");
        assert_eq!(task.stop(), "2022-04-20 10:30:00");
        assert_eq!(task.project(), "Admin");
        assert_eq!(task.joined_tags(), "dev,refactoring");
        assert_eq!(db.find_by_id::<Task>(1).unwrap(), Some(task.clone()));
        assert!(output(p).ends_with(&format!("{}\n", task)));
    }

    #[test]
    fn start_time_defaults_to_previous_stop_of_the_day() {
        let db = Database::open_in_memory().unwrap();
        let mut p = prompter("\n9:00\n10:30\nAdmin\nfirst\n\n\n");
        run(&db, &mut p, &[], None, "2022-04-20").unwrap();

        let mut p = prompter("\n\n11:00\nAdmin\nsecond\n\n\n");
        let task = run(&db, &mut p, &[], None, "2022-04-20").unwrap();
        assert_eq!(task.start(), "2022-04-20 10:30:00");
        assert!(output(p).contains("* Start time [10:30]: "));
    }

    #[test]
    fn reversed_times_fail() {
        let db = Database::open_in_memory().unwrap();
        let mut p = prompter("\n11:00\n10:00\n");
        let err = run(&db, &mut p, &[], None, "2022-04-20").unwrap_err();
        assert!(err.to_string().starts_with("Invalid chronology"));
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn resume_copies_project_description_and_tags() {
        let db = Database::open_in_memory().unwrap();
        let mut p = prompter("\n9:00\n10:00\nAdmin\nWeekly report\nreport\n\n");
        run(&db, &mut p, &[], None, "2022-04-20").unwrap();

        let mut p = prompter("y\n2022-04-21\n14:00\n15:00\ncontinued\n");
        let task = run(&db, &mut p, &[], Some("weekly"), "2022-04-22").unwrap();
        assert_eq!(task.project(), "Admin");
        assert_eq!(task.description(), "Weekly report");
        assert_eq!(task.joined_tags(), "report");
        assert_eq!(task.comment(), "continued");
        assert!(output(p).starts_with("Resuming [Admin] \"Weekly report\" ? [Y/n]: "));
    }

    #[test]
    fn declined_resume_asks_everything() {
        let db = Database::open_in_memory().unwrap();
        let mut p = prompter("\n9:00\n10:00\nAdmin\nWeekly report\n\n\n");
        run(&db, &mut p, &[], None, "2022-04-20").unwrap();

        let mut p = prompter("n\n\n10:00\n11:00\nSupport\nticket\n\n\n");
        let task = run(&db, &mut p, &[], Some("weekly"), "2022-04-20").unwrap();
        assert_eq!(task.project(), "Support");
        assert_eq!(task.description(), "ticket");
    }
}
