//! The task list as it is rendered: the mirror, filtered by free text and
//! sorted by one of the task dates.

use crate::task::Task;
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which date a [`SortMode`] orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    AssignedDate,
    DueDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum SortMode {
    AssignedDateAsc,
    #[default]
    AssignedDateDesc,
    DueDateAsc,
    DueDateDesc,
}

const SORT_MODE_NAMES: &str = "assignedDateAsc, assignedDateDesc, dueDateAsc, dueDateDesc";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sort mode '{0}', expected one of {names}", names = SORT_MODE_NAMES)]
pub struct ParseSortModeError(String);

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        Self::AssignedDateAsc,
        Self::AssignedDateDesc,
        Self::DueDateAsc,
        Self::DueDateDesc,
    ];

    pub fn key(self) -> SortKey {
        match self {
            SortMode::AssignedDateAsc | SortMode::AssignedDateDesc => SortKey::AssignedDate,
            SortMode::DueDateAsc | SortMode::DueDateDesc => SortKey::DueDate,
        }
    }

    pub fn is_ascending(self) -> bool {
        matches!(self, SortMode::AssignedDateAsc | SortMode::DueDateAsc)
    }

    /// The mode the dashboard's sort button switches to.
    pub fn next(self) -> Self {
        match self {
            SortMode::AssignedDateDesc => SortMode::AssignedDateAsc,
            SortMode::AssignedDateAsc => SortMode::DueDateDesc,
            SortMode::DueDateDesc => SortMode::DueDateAsc,
            SortMode::DueDateAsc => SortMode::AssignedDateDesc,
        }
    }

    /// Short label for the sort button, e.g. "Due ↑".
    pub fn label(self) -> String {
        let key = match self.key() {
            SortKey::AssignedDate => "Assigned",
            SortKey::DueDate => "Due",
        };
        let arrow = if self.is_ascending() { "↑" } else { "↓" };
        format!("{key} {arrow}")
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::AssignedDateAsc => "assignedDateAsc",
            SortMode::AssignedDateDesc => "assignedDateDesc",
            SortMode::DueDateAsc => "dueDateAsc",
            SortMode::DueDateDesc => "dueDateDesc",
        }
    }

    fn sort_date(self, task: &Task) -> NaiveDate {
        let date = match self.key() {
            SortKey::AssignedDate => task.assigned_date,
            SortKey::DueDate => task.due_date,
        };
        // Missing dates order before every real one.
        date.unwrap_or(NaiveDate::MIN)
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseSortModeError(s.to_string()))
    }
}

/// What the user typed into the search box and picked on the sort button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub free_text: String,
    pub sort_mode: SortMode,
}

impl ViewQuery {
    pub fn new(free_text: impl Into<String>, sort_mode: SortMode) -> Self {
        Self {
            free_text: free_text.into(),
            sort_mode,
        }
    }
}

/// Filters and sorts `tasks` for display.
///
/// A task is kept if its title or description contains the query text,
/// ignoring case. The query is not trimmed, so whitespace matches literally.
/// Sorting is stable: tasks with equal dates keep their mirror order.
pub fn visible_tasks<'a>(tasks: &'a [Task], query: &ViewQuery) -> Vec<&'a Task> {
    let needle = query.free_text.to_lowercase();
    let mode = query.sort_mode;
    let mut visible: Vec<&Task> = tasks.iter().filter(|task| task.matches(&needle)).collect();
    if mode.is_ascending() {
        visible.sort_by_key(|task| mode.sort_date(task));
    } else {
        visible.sort_by(|a, b| mode.sort_date(b).cmp(&mode.sort_date(a)));
    }
    visible
}
