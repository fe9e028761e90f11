//! captainlog
//!
//! Personal time-tracking log: interactive task entry, CSV import/export
//! and a web front-end over a SQLite database.

use anyhow::{Context, Result};
use captainlog::cli::entry::{self, Prompter};
use captainlog::cli::{Cli, Command, commands};
use captainlog::config::Config;
use captainlog::db::Database;
use captainlog::types::DATE_FORMAT;
use captainlog::web::WebServer;
use clap::Parser;
use std::fs::OpenOptions;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("Cannot open log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn open_database(cli: &Cli, config: &Config, debug: bool) -> Result<Database> {
    let path = match &cli.database {
        Some(path) => path.clone(),
        None => config.database_path(debug)?,
    };
    let db = Database::open_path(&path)?;
    Ok(db)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_logging(&cli)?;

    let command = std::mem::take(&mut cli.action).command();
    let mut stdout = std::io::stdout();

    if command == Command::Version {
        return commands::version(&mut stdout);
    }

    let debug = captainlog::is_debug_build();
    let config_path = Config::resolve_path(cli.config.as_deref(), debug)?;
    let config = Config::load(&config_path)?;
    info!("Configuration file: {}", config_path.display());

    let db = open_database(&cli, &config, debug)?;

    match command {
        Command::Version => {}
        Command::Web => {
            let server = WebServer::new(&config, db)
                .context("An error occurred during the server initialization")?;
            server.run().await?;
        }
        Command::Import(path) => {
            commands::import(&db, &path, &mut stdout)?;
        }
        Command::Export(path) => {
            commands::export(&db, &path, &mut stdout)?;
        }
        Command::Tail(count) => {
            commands::tail(&db, count, &mut stdout)?;
        }
        Command::Delete(target) => {
            commands::delete(&db, &target, &mut Prompter::stdio())?;
        }
        Command::Entry { resume } => {
            let today = chrono::Local::now().format(DATE_FORMAT).to_string();
            entry::run(
                &db,
                &mut Prompter::stdio(),
                &config.projects,
                resume.as_deref(),
                &today,
            )?;
        }
    }

    Ok(())
}
