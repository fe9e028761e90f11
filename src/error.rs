//! Structured error type shared by the store, the value layer and the front-ends.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Storage lifecycle
    Open,
    AlreadyOpen,
    NotOpen,
    Schema,
    Prepare,
    Exec,

    // Schedule and task validation
    InvalidDateTime,
    Chronology,
    EmptyField,

    // Text normalizers
    UnknownFormat,

    // Interchange formats
    JsonShape,
    CsvHeader,
    CsvRow,
    CsvField,

    InvalidCount,
    Io,
}

/// Error carrying a code and a human readable message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Prefix the message with the context of the layer handling the error.
    /// The code is kept so callers can still match on it.
    pub fn context(mut self, prefix: impl fmt::Display) -> Self {
        self.message = format!("{}{}", prefix, self.message);
        self
    }

    // Convenience constructors

    pub fn open(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Open, format!("Cannot open database: {}", err))
    }

    pub fn already_open() -> Self {
        Self::new(ErrorCode::AlreadyOpen, "Database already opened")
    }

    pub fn not_open() -> Self {
        Self::new(ErrorCode::NotOpen, "Database not opened")
    }

    pub fn schema(err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Schema,
            format!("Failed to initialize the database: {}", err),
        )
    }

    pub fn prepare(err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Prepare,
            format!("Failed to prepare statement: {}", err),
        )
    }

    pub fn exec(err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Exec,
            format!("Failed to execute the statement: {}", err),
        )
    }

    pub fn invalid_date_time(value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidDateTime,
            format!("Invalid date time value: {}", value),
        )
    }

    pub fn chronology(start: &str, stop: &str) -> Self {
        Self::new(
            ErrorCode::Chronology,
            format!("Invalid chronology: {} -> {}", start, stop),
        )
    }

    pub fn empty_field(field: &str) -> Self {
        Self::new(ErrorCode::EmptyField, format!("{} must not be empty", field))
    }

    pub fn unknown_format(kind: &str, input: &str) -> Self {
        Self::new(
            ErrorCode::UnknownFormat,
            format!("Unknown {} format: {}", kind, input),
        )
    }

    pub fn missing_property(property: &str) -> Self {
        Self::new(
            ErrorCode::JsonShape,
            format!("Missing property: {}", property),
        )
    }

    pub fn json_shape(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::JsonShape, format!("Invalid task: {}", err))
    }

    pub fn csv_header(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::CsvHeader, reason)
    }

    pub fn csv_row(line: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CsvRow,
            format!("Error for line: {}\n\t{}", line, err),
        )
    }

    pub fn csv_field(task_id: i64, column: &str) -> Self {
        Self::new(
            ErrorCode::CsvField,
            format!("Cannot export task {}: {} holds a separator or a line break", task_id, column),
        )
    }

    pub fn invalid_count(count: i64) -> Self {
        Self::new(
            ErrorCode::InvalidCount,
            format!("Invalid count: {}", count),
        )
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::exec(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err)
    }
}

/// Result type for store and value-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
