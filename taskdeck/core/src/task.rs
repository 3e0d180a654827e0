use crate::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wire format of assigned and due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Backend-assigned task identifier. Opaque and stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Progress of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskStatus {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "Not Started"))]
    NotStarted,
    #[cfg_attr(feature = "serde", serde(rename = "In Progress"))]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::NotStarted, Self::InProgress, Self::Completed];

    /// The label stored in the backend and shown on the status badge.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Lenient read of a stored status: anything missing or unrecognised is `NotStarted`.
    pub fn from_wire(value: Option<&str>) -> Self {
        value.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A single task as mirrored from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assigned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a not-started task with no description and no dates.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::default(),
            assigned_date: None,
            due_date: None,
            created_at: None,
        }
    }

    /// Builds the task the backend will hold once `draft` has been stored under `id`.
    pub fn from_draft(id: impl Into<TaskId>, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            assigned_date: draft.assigned_date,
            due_date: draft.due_date,
            created_at: Some(created_at),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_assigned_date(mut self, date: Option<NaiveDate>) -> Self {
        self.assigned_date = date;
        self
    }

    pub fn with_due_date(mut self, date: Option<NaiveDate>) -> Self {
        self.due_date = date;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// True if title or description contains `needle`. `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Rejects a task whose title is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }
}

/// Fields entered in the "Add New Task" form, before the backend assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assigned_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn assigned_date(mut self, date: NaiveDate) -> Self {
        self.assigned_date = Some(date);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Trims title and description, rejecting the draft if the title ends up empty.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(Self {
            title,
            description: self.description.trim().to_string(),
            ..self
        })
    }
}

/// Reads a stored `YYYY-MM-DD` date. Empty or unparseable input counts as "not set".
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Writes a date the way the backend stores it; "not set" is the empty string.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
