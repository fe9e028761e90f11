//! Core value types: task schedules, tasks and their JSON wire shape.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Storage format of schedule endpoints.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Format of a bare day (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format of a clock time (`HH:MM`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Task identifier. `0` means "not persisted yet".
pub type TaskId = i64;

/// Id of a task that has not been stored.
pub const UNASSIGNED_ID: TaskId = 0;

pub const PROPERTY_ID: &str = "id";
pub const PROPERTY_START: &str = "start";
pub const PROPERTY_STOP: &str = "stop";
pub const PROPERTY_PROJECT: &str = "project";
pub const PROPERTY_DESCRIPTION: &str = "description";
pub const PROPERTY_TAGS: &str = "tags";
pub const PROPERTY_COMMENT: &str = "comment";

/// Properties a JSON task must carry to be inserted or updated.
pub const REQUIRED_PROPERTIES: &[&str] = &[
    PROPERTY_START,
    PROPERTY_STOP,
    PROPERTY_PROJECT,
    PROPERTY_DESCRIPTION,
];

/// Tag set. Ordered so that joining is stable.
pub type Tags = BTreeSet<String>;

/// Parse a comma separated tag list. Elements are trimmed, empty ones dropped.
pub fn tags_from_string(s: &str) -> Tags {
    s.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags with `,` in set order.
pub fn join_tags(tags: &Tags) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// Year, month, day, hour and minute of a schedule endpoint, zero-padded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokenDownTime {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
}

impl BrokenDownTime {
    fn from_parsed(parsed: &NaiveDateTime) -> Self {
        Self {
            year: parsed.format("%Y").to_string(),
            month: parsed.format("%m").to_string(),
            day: parsed.format("%d").to_string(),
            hour: parsed.format("%H").to_string(),
            minute: parsed.format("%M").to_string(),
        }
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// `HH:MM`
    pub fn time(&self) -> String {
        format!("{}:{}", self.hour, self.minute)
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` endpoint. Fields must be zero-padded so the
/// stored text sorts and matches day prefixes in SQL.
fn parse_date_time(value: &str) -> Result<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|_| Error::invalid_date_time(value))?;
    if parsed.format(DATE_TIME_FORMAT).to_string() != value {
        return Err(Error::invalid_date_time(value));
    }
    Ok(parsed)
}

/// Half-open time interval of a task. `start < stop` always holds.
///
/// Endpoints are canonical `YYYY-MM-DD HH:MM:SS` strings, stored as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSchedule {
    start: String,
    stop: String,
    start_at: NaiveDateTime,
    stop_at: NaiveDateTime,
}

impl TaskSchedule {
    /// Build a schedule from two `YYYY-MM-DD HH:MM:SS` strings.
    pub fn new(start: impl Into<String>, stop: impl Into<String>) -> Result<Self> {
        let start = start.into();
        let stop = stop.into();
        let start_at = parse_date_time(&start)?;
        let stop_at = parse_date_time(&stop)?;
        if start_at >= stop_at {
            return Err(Error::chronology(&start, &stop));
        }
        Ok(Self {
            start,
            stop,
            start_at,
            stop_at,
        })
    }

    /// Build a schedule from a day and two `HH:MM` clock times.
    pub fn from_day(date: &str, start_time: &str, stop_time: &str) -> Result<Self> {
        Self::new(
            format!("{} {}:00", date, start_time),
            format!("{} {}:00", date, stop_time),
        )
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn stop(&self) -> &str {
        &self.stop
    }

    pub fn broken_down_start(&self) -> BrokenDownTime {
        BrokenDownTime::from_parsed(&self.start_at)
    }

    pub fn broken_down_stop(&self) -> BrokenDownTime {
        BrokenDownTime::from_parsed(&self.stop_at)
    }

    /// Length of the interval in seconds, always positive.
    pub fn duration_seconds(&self) -> u64 {
        (self.stop_at - self.start_at).num_seconds().unsigned_abs()
    }
}

impl fmt::Display for TaskSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.stop)
    }
}

/// A tracked unit of work.
///
/// Equality compares everything except the id.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    schedule: TaskSchedule,
    project: String,
    description: String,
    tags: Tags,
    comment: String,
}

impl Task {
    /// Create an unassigned task. `tags` is a comma separated list.
    pub fn new(
        schedule: TaskSchedule,
        project: impl Into<String>,
        description: impl Into<String>,
        tags: &str,
        comment: impl Into<String>,
    ) -> Result<Self> {
        Self::with_tags(
            schedule,
            project,
            description,
            tags_from_string(tags),
            comment,
        )
    }

    /// Create an unassigned task from an already parsed tag set.
    pub fn with_tags(
        schedule: TaskSchedule,
        project: impl Into<String>,
        description: impl Into<String>,
        tags: Tags,
        comment: impl Into<String>,
    ) -> Result<Self> {
        let project = project.into();
        let description = description.into();
        if project.is_empty() {
            return Err(Error::empty_field(PROPERTY_PROJECT));
        }
        if description.is_empty() {
            return Err(Error::empty_field(PROPERTY_DESCRIPTION));
        }
        Ok(Self {
            id: UNASSIGNED_ID,
            schedule,
            project,
            description,
            tags,
            comment: comment.into(),
        })
    }

    /// Attach a store-assigned id.
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn schedule(&self) -> &TaskSchedule {
        &self.schedule
    }

    pub fn start(&self) -> &str {
        self.schedule.start()
    }

    pub fn stop(&self) -> &str {
        self.schedule.stop()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn joined_tags(&self) -> String {
        join_tags(&self.tags)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn duration_seconds(&self) -> u64 {
        self.schedule.duration_seconds()
    }

    /// Build a task from a JSON object carrying at least the required properties.
    /// An `id` property, when present, is kept.
    pub fn from_json(value: &Value) -> Result<Self> {
        let doc = TaskDocument::from_json(value)?;
        doc.into_task()
    }

    /// JSON wire shape of the task. The id is left out until the task is stored.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(TaskDocument::from(self)).map_err(Error::json_shape)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.schedule == other.schedule
            && self.project == other.project
            && self.description == other.description
            && self.comment == other.comment
            && self.tags == other.tags
    }
}

impl Eq for Task {}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} [{}] {} : {}",
            self.id, self.project, self.schedule, self.description
        )?;
        if !self.tags.is_empty() {
            write!(f, " ({})", self.joined_tags())?;
        }
        Ok(())
    }
}

/// JSON wire shape of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub start: String,
    pub stop: String,
    pub project: String,
    pub description: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub comment: String,
}

impl TaskDocument {
    /// Check required properties then decode. Any failure is a `JsonShape` error.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::json_shape("expected a JSON object"))?;
        for property in REQUIRED_PROPERTIES {
            if !object.contains_key(*property) {
                return Err(Error::missing_property(property));
            }
        }
        serde_json::from_value(value.clone()).map_err(Error::json_shape)
    }

    pub fn into_task(self) -> Result<Task> {
        let schedule = TaskSchedule::new(self.start, self.stop)?;
        let tags = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let task = Task::with_tags(schedule, self.project, self.description, tags, self.comment)?;
        Ok(match self.id {
            Some(id) => task.with_id(id),
            None => task,
        })
    }
}

impl From<&Task> for TaskDocument {
    fn from(task: &Task) -> Self {
        Self {
            id: task.is_persisted().then_some(task.id),
            start: task.start().to_string(),
            stop: task.stop().to_string(),
            project: task.project.clone(),
            description: task.description.clone(),
            tags: task.tags.clone(),
            comment: task.comment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn sample_task() -> Task {
        let schedule = TaskSchedule::new("2022-04-15 15:00:00", "2022-04-15 15:02:30").unwrap();
        Task::new(schedule, "MyProject", "code cleanup", "dev,refactoring", "my comment").unwrap()
    }

    #[test]
    fn create_valid_task_schedule() {
        let schedule = TaskSchedule::new("2022-04-15 15:00:00", "2022-04-15 15:02:00").unwrap();
        assert_eq!(schedule.duration_seconds(), 120);
    }

    #[test]
    fn create_valid_task_schedule_from_day() {
        let schedule = TaskSchedule::from_day("2022-04-15", "15:00", "15:02").unwrap();
        assert_eq!(schedule.start(), "2022-04-15 15:00:00");
        assert_eq!(schedule.stop(), "2022-04-15 15:02:00");
        assert_eq!(schedule.duration_seconds(), 120);
    }

    #[test]
    fn create_invalid_task_chronology() {
        let err = TaskSchedule::new("2022-04-15 15:00:00", "2021-04-15 15:02:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::Chronology);
    }

    #[test]
    fn zero_length_schedule_is_rejected() {
        let err = TaskSchedule::new("2022-04-15 15:00:00", "2022-04-15 15:00:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::Chronology);
    }

    #[test]
    fn create_invalid_task_dates() {
        let err = TaskSchedule::new("2022-04-32 15:00:00", "2022-04-15 15:02:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateTime);
        let err = TaskSchedule::new("2022-04-15 15:00:00", "2022-13-15 15:02:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateTime);
        let err = TaskSchedule::new("2022-04-15 15:00", "2022-04-15 16:00:00").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateTime);
    }

    #[test]
    fn unpadded_endpoints_are_rejected() {
        for value in [
            "2022-04-20 9:00:00",
            "2022-4-20 09:00:00",
            "2022-04-2 09:00:00",
            "2022-04-20 09:0:00",
            "2022-04-20 09:00:0",
        ] {
            let err = TaskSchedule::new(value, "2022-04-20 23:00:00").unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidDateTime, "{}", value);
        }
        let err = TaskSchedule::from_day("2022-04-20", "9:00", "10:30").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateTime);
    }

    #[test]
    fn task_from_json_rejects_unpadded_start() {
        let err = Task::from_json(&json!({
            "start": "2022-4-20 09:00:00",
            "stop": "2022-04-20 10:00:00",
            "project": "p",
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateTime);
    }

    #[test]
    fn get_broken_down_time() {
        let schedule = TaskSchedule::new("2022-04-15 15:00:00", "2022-04-15 15:02:30").unwrap();
        let start = schedule.broken_down_start();
        assert_eq!(start.year, "2022");
        assert_eq!(start.month, "04");
        assert_eq!(start.day, "15");
        assert_eq!(start.hour, "15");
        assert_eq!(start.minute, "00");
        assert_eq!(start.date(), "2022-04-15");
        assert_eq!(schedule.broken_down_stop().time(), "15:02");
    }

    #[test]
    fn duration_is_positive_across_midnight() {
        let schedule = TaskSchedule::new("2022-04-15 23:30:00", "2022-04-16 00:15:00").unwrap();
        assert_eq!(schedule.duration_seconds(), 45 * 60);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = tags_from_string(" dev , refactoring,dev,,");
        assert_eq!(
            tags,
            Tags::from(["dev".to_string(), "refactoring".to_string()])
        );
        assert_eq!(join_tags(&tags), "dev,refactoring");
        assert!(tags_from_string("").is_empty());
    }

    #[test]
    fn tags_round_trip_through_join() {
        let tags = tags_from_string("b,a,c");
        assert_eq!(tags_from_string(&join_tags(&tags)), tags);
        assert_eq!(join_tags(&tags_from_string("c,b,a")), join_tags(&tags));
    }

    #[test]
    fn task_equality_ignores_id() {
        let task = sample_task();
        let stored = sample_task().with_id(42);
        assert_eq!(task, stored);
        assert!(!task.is_persisted());
        assert!(stored.is_persisted());
    }

    #[test]
    fn task_requires_project_and_description() {
        let schedule = TaskSchedule::from_day("2022-04-15", "09:00", "10:00").unwrap();
        let err = Task::new(schedule.clone(), "", "d", "", "").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyField);
        let err = Task::new(schedule, "p", "", "", "").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyField);
    }

    #[test]
    fn task_display() {
        let task = sample_task().with_id(3);
        assert_eq!(
            task.to_string(),
            "@3 [MyProject] 2022-04-15 15:00:00 -> 2022-04-15 15:02:30 : code cleanup (dev,refactoring)"
        );
    }

    #[test]
    fn task_from_json_with_optional_fields_missing() {
        let task = Task::from_json(&json!({
            "start": "2022-04-21 09:15:00",
            "stop": "2022-04-21 10:20:00",
            "project": "p",
            "description": "d"
        }))
        .unwrap();
        assert_eq!(task.id(), UNASSIGNED_ID);
        assert!(task.tags().is_empty());
        assert_eq!(task.comment(), "");
    }

    #[test]
    fn task_from_json_missing_required_property() {
        let err = Task::from_json(&json!({
            "start": "2022-04-21 09:15:00",
            "project": "p",
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::JsonShape);
        assert_eq!(err.message, "Missing property: stop");
    }

    #[test]
    fn task_from_json_wrong_type() {
        let err = Task::from_json(&json!({
            "start": "2022-04-21 09:15:00",
            "stop": "2022-04-21 10:20:00",
            "project": 12,
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::JsonShape);

        let err = Task::from_json(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::JsonShape);
    }

    #[test]
    fn task_from_json_validates_schedule() {
        let err = Task::from_json(&json!({
            "start": "2022-04-21 10:20:00",
            "stop": "2022-04-21 09:15:00",
            "project": "p",
            "description": "d"
        }))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Chronology);
    }

    #[test]
    fn task_json_round_trip() {
        let task = sample_task().with_id(7);
        let value = task.to_json().unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["tags"], json!(["dev", "refactoring"]));
        let back = Task::from_json(&value).unwrap();
        assert_eq!(back, task);
        assert_eq!(back.id(), 7);
    }

    #[test]
    fn unassigned_task_json_has_no_id() {
        let value = sample_task().to_json().unwrap();
        assert!(value.get("id").is_none());
    }
}
