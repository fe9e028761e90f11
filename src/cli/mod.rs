//! CLI definitions for captainlog
//!
//! Every action is a flag and at most one may be given. Without an action
//! the interactive entry of a new task starts.

pub mod commands;
pub mod entry;

use clap::{Args, Parser};
use std::path::PathBuf;

/// Personal time-tracking log
#[derive(Parser, Debug)]
#[command(name = "captainlog", about, long_about = None)]
pub struct Cli {
    /// Location of the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,

    #[command(flatten)]
    pub action: ActionArgs,
}

/// Mutually exclusive actions.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct ActionArgs {
    /// Print version information and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Replace every task with the content of a CSV file
    #[arg(short, long, value_name = "CSV")]
    pub import: Option<PathBuf>,

    /// Export every task to a CSV file
    #[arg(short, long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Resume a task from a partial description
    #[arg(short, long, value_name = "TEXT")]
    pub resume: Option<String>,

    /// Print the last <N> tasks
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub tail: Option<i64>,

    /// Delete the task with the given id or running at the given date-time
    #[arg(short, long, value_name = "ID|YYYY-MM-DD HH:MM")]
    pub delete: Option<String>,

    /// Run as a web server on the port 'web_port' from the configuration
    #[arg(short, long)]
    pub web: bool,
}

/// The action selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Import(PathBuf),
    Export(PathBuf),
    Tail(i64),
    Delete(String),
    Web,
    /// Interactive entry, optionally resuming a previous task.
    Entry { resume: Option<String> },
}

impl ActionArgs {
    pub fn command(self) -> Command {
        if self.version {
            Command::Version
        } else if let Some(path) = self.import {
            Command::Import(path)
        } else if let Some(path) = self.export {
            Command::Export(path)
        } else if let Some(count) = self.tail {
            Command::Tail(count)
        } else if let Some(target) = self.delete {
            Command::Delete(target)
        } else if self.web {
            Command::Web
        } else {
            Command::Entry {
                resume: self.resume,
            }
        }
    }
}
