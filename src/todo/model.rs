#![forbid(unsafe_code)]

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::error::TodoError;
use crate::todo::date::{self, DueDateInput};

pub const NO_DESCRIPTION: &str = "No description";

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                TodoError::validation(format!(
                    "priority must be low, medium, or high (got '{s}')"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    #[serde(rename = "To-Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    /// Board column order.
    pub const ALL: [Self; 3] = [Self::ToDo, Self::InProgress, Self::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "To-Do",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| {
                TodoError::validation(format!(
                    "status must be To-Do, In Progress, or Completed (got '{s}')"
                ))
            })
    }
}

/// Opaque task identity, assigned once when the task is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts any non-blank stored identifier.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Borrow<str> for TodoId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plain stored shape of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDo {
    id: TodoId,
    title: String,
    description: String,
    due_date: Date,
    priority: Priority,
    project_name: String,
    status: Status,
}

impl ToDo {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: Date,
        priority: Priority,
        project_name: impl Into<String>,
        status: Status,
    ) -> Result<Self, TodoError> {
        Self::with_id(
            TodoId::generate(),
            title.into(),
            description.into(),
            due_date,
            priority,
            project_name.into(),
            status,
        )
    }

    fn with_id(
        id: TodoId,
        title: String,
        description: String,
        due_date: Date,
        priority: Priority,
        project_name: String,
        status: Status,
    ) -> Result<Self, TodoError> {
        validate_title(&title)?;
        if project_name.trim().is_empty() {
            return Err(TodoError::validation("to-do must be attached to a project"));
        }
        Ok(Self {
            id,
            title,
            description: description_or_default(description),
            due_date,
            priority,
            project_name,
            status,
        })
    }

    /// Rebuilds a task from its stored shape, re-running every check. A
    /// missing or blank id is replaced with a fresh one.
    pub fn from_record(record: TodoRecord) -> Result<Self, TodoError> {
        let id = record
            .id
            .as_deref()
            .and_then(TodoId::from_stored)
            .unwrap_or_else(TodoId::generate);
        let due_date = date::parse_record_date(&record.due_date)?;
        Self::with_id(
            id,
            record.title,
            record.description,
            due_date,
            record.priority,
            record.project_name,
            record.status,
        )
    }

    #[must_use]
    pub fn to_record(&self) -> TodoRecord {
        TodoRecord {
            id: Some(self.id.to_string()),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: date::format_record_date(self.due_date),
            priority: self.priority,
            project_name: self.project_name.clone(),
            status: self.status,
        }
    }

    #[must_use]
    pub fn id(&self) -> &TodoId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn due_date(&self) -> Date {
        self.due_date
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn update_title(&mut self, title: impl Into<String>) -> Result<(), TodoError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        Ok(())
    }

    pub fn update_description(&mut self, description: impl Into<String>) {
        self.description = description_or_default(description.into());
    }

    pub fn update_due_date(&mut self, due: impl Into<DueDateInput>) -> Result<(), TodoError> {
        self.due_date = due.into().resolve()?;
        Ok(())
    }

    pub fn update_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn update_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Only rewrites the back-reference; the owning collection must move the
    /// task itself.
    pub(crate) fn update_project(&mut self, project_name: impl Into<String>) {
        self.project_name = project_name.into();
    }
}

impl fmt::Display for ToDo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Priority: {}, Due: {}, Status: {}, Project: {}) - {}",
            self.title,
            self.priority,
            date::format_iso_date(self.due_date),
            self.status,
            self.project_name,
            self.description
        )
    }
}

fn validate_title(title: &str) -> Result<(), TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::validation("title is required"));
    }
    Ok(())
}

fn description_or_default(description: String) -> String {
    if description.trim().is_empty() {
        NO_DESCRIPTION.to_owned()
    } else {
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample() -> ToDo {
        ToDo::new(
            "50-pushups",
            "do 50 push ups in 3 minutes",
            date!(2025 - 06 - 09),
            Priority::High,
            "Default",
            Status::ToDo,
        )
        .unwrap()
    }

    #[test]
    fn construction_keeps_inputs() {
        let t = sample();
        assert_eq!(t.title(), "50-pushups");
        assert_eq!(t.description(), "do 50 push ups in 3 minutes");
        assert_eq!(t.due_date(), date!(2025 - 06 - 09));
        assert_eq!(t.priority(), Priority::High);
        assert_eq!(t.project_name(), "Default");
        assert_eq!(t.status(), Status::ToDo);
        assert_eq!(t.id().as_str().len(), 32);
    }

    #[test]
    fn empty_description_is_replaced() {
        let t = ToDo::new(
            "x",
            "",
            date!(2025 - 01 - 01),
            Priority::default(),
            "P",
            Status::default(),
        )
        .unwrap();
        assert_eq!(t.description(), NO_DESCRIPTION);
        assert_eq!(t.priority(), Priority::Medium);
        assert_eq!(t.status(), Status::ToDo);
    }

    #[test]
    fn construction_rejects_blank_title_and_project() {
        let d = date!(2025 - 01 - 01);
        let err = ToDo::new("", "", d, Priority::Low, "P", Status::ToDo).unwrap_err();
        assert!(err.is_validation());
        let err = ToDo::new("  ", "", d, Priority::Low, "P", Status::ToDo).unwrap_err();
        assert!(err.is_validation());
        let err = ToDo::new("t", "", d, Priority::Low, "", Status::ToDo).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn enum_text_outside_the_set_is_rejected() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().unwrap_err().is_validation());
        assert!("HIGH".parse::<Priority>().is_err());
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("Done".parse::<Status>().unwrap_err().is_validation());
    }

    #[test]
    fn updates_validate_input() {
        let mut t = sample();
        assert!(t.update_title("").is_err());
        assert_eq!(t.title(), "50-pushups");
        t.update_title("60-pushups").unwrap();
        assert_eq!(t.title(), "60-pushups");

        t.update_description("");
        assert_eq!(t.description(), NO_DESCRIPTION);

        assert!(t.update_due_date("2025-02-30").is_err());
        assert_eq!(t.due_date(), date!(2025 - 06 - 09));
        t.update_due_date("2025-07-01").unwrap();
        assert_eq!(t.due_date(), date!(2025 - 07 - 01));

        t.update_priority(Priority::Low);
        t.update_status(Status::Completed);
        assert_eq!(t.priority(), Priority::Low);
        assert_eq!(t.status(), Status::Completed);
    }

    #[test]
    fn update_project_only_touches_the_field() {
        let mut t = sample();
        t.update_project("Work");
        assert_eq!(t.project_name(), "Work");
    }

    #[test]
    fn record_round_trip_preserves_identity() {
        let t = sample();
        let record = t.to_record();
        assert_eq!(record.due_date, "2025-06-09T00:00:00.000Z");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["dueDate"], "2025-06-09T00:00:00.000Z");
        assert_eq!(json["projectName"], "Default");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["status"], "To-Do");

        let back: TodoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(ToDo::from_record(back).unwrap(), t);
    }

    #[test]
    fn record_without_id_gets_a_fresh_one() {
        let mut record = sample().to_record();
        record.id = None;
        let t = ToDo::from_record(record.clone()).unwrap();
        assert_eq!(t.id().as_str().len(), 32);

        record.id = Some("  ".to_owned());
        assert!(ToDo::from_record(record).is_ok());
    }

    #[test]
    fn record_with_bad_fields_is_rejected() {
        let mut record = sample().to_record();
        record.due_date = "2024-02-30T00:00:00.000Z".to_owned();
        assert!(ToDo::from_record(record).unwrap_err().is_validation());

        let mut record = sample().to_record();
        record.title = String::new();
        assert!(ToDo::from_record(record).unwrap_err().is_validation());
    }

    #[test]
    fn display_matches_dump_format() {
        assert_eq!(
            sample().to_string(),
            "50-pushups (Priority: high, Due: 2025-06-09, Status: To-Do, Project: Default) - do 50 push ups in 3 minutes"
        );
    }
}
