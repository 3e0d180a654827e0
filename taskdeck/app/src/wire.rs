//! How tasks and user records are laid out in the document store.

use crate::connectors::{BackendError, Fields, Record};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use taskdeck_core::task::{format_date, parse_date};
use taskdeck_core::{Task, TaskDraft, TaskStatus};

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const STATUS: &str = "status";
pub const ASSIGNED_DATE: &str = "assignedDate";
pub const DUE_DATE: &str = "dueDate";
pub const CREATED_AT: &str = "createdAt";
pub const EMAIL: &str = "email";
pub const PUSH_TOKEN: &str = "fcmToken";

/// Task fields as stored. Everything but the title may be absent, and any of
/// them may hold a value of the wrong type.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    title: String,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    assigned_date: Option<Value>,
    #[serde(default)]
    due_date: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
}

fn as_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

/// An RFC 3339 string, or a `{seconds, nanoseconds}` server timestamp.
fn read_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}

/// Reads a stored task document.
///
/// Only a missing or blank title is fatal. Unknown statuses read as not
/// started; dates and timestamps that do not parse, or are not strings, read
/// as unset.
pub fn task_from_record(record: &Record) -> Result<Task, BackendError> {
    let malformed = |reason: String| BackendError::Malformed {
        id: record.id.clone(),
        reason,
    };
    let stored: StoredTask = serde_json::from_value(Value::Object(record.fields.clone()))
        .map_err(|e| malformed(e.to_string()))?;
    if stored.title.trim().is_empty() {
        return Err(malformed("title is empty".to_string()));
    }
    Ok(Task {
        id: record.id.clone().into(),
        description: as_str(&stored.description).unwrap_or_default().to_string(),
        status: TaskStatus::from_wire(as_str(&stored.status)),
        assigned_date: as_str(&stored.assigned_date).and_then(parse_date),
        due_date: as_str(&stored.due_date).and_then(parse_date),
        created_at: stored.created_at.as_ref().and_then(read_timestamp),
        title: stored.title,
    })
}

/// The fields a task edit writes.
pub fn editable_fields(task: &Task) -> Fields {
    let mut fields = Fields::new();
    fields.insert(TITLE.into(), json!(task.title));
    fields.insert(DESCRIPTION.into(), json!(task.description));
    fields.insert(STATUS.into(), json!(task.status.as_str()));
    fields.insert(ASSIGNED_DATE.into(), json!(format_date(task.assigned_date)));
    fields.insert(DUE_DATE.into(), json!(format_date(task.due_date)));
    fields
}

/// The editable fields of `after` that differ from `before`.
///
/// Fields the user left alone are not written, so a stored value the mirror
/// could not read survives the edit.
pub fn changed_fields(before: Option<&Task>, after: &Task) -> Fields {
    let mut fields = editable_fields(after);
    if let Some(before) = before {
        let unchanged = editable_fields(before);
        fields.retain(|key, value| unchanged.get(key) != Some(value));
    }
    fields
}

/// The document written when a task is created.
pub fn new_task_fields(draft: &TaskDraft, created_at: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(TITLE.into(), json!(draft.title));
    fields.insert(DESCRIPTION.into(), json!(draft.description));
    fields.insert(STATUS.into(), json!(draft.status.as_str()));
    fields.insert(ASSIGNED_DATE.into(), json!(format_date(draft.assigned_date)));
    fields.insert(DUE_DATE.into(), json!(format_date(draft.due_date)));
    fields.insert(CREATED_AT.into(), json!(created_at.to_rfc3339()));
    fields
}

/// The user document written at sign-up.
pub fn user_fields(email: &str, push_token: &str, created_at: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(EMAIL.into(), json!(email));
    fields.insert(PUSH_TOKEN.into(), json!(push_token));
    fields.insert(CREATED_AT.into(), json!(created_at.to_rfc3339()));
    fields
}

/// Parses a JSON array of task documents, each carrying its `id` inline.
///
/// A document without an id is named after its position, skipping any name
/// another document already claims.
pub fn records_from_json(json: &str) -> Result<Vec<Record>, serde_json::Error> {
    let documents: Vec<Fields> = serde_json::from_str(json)?;
    let documents: Vec<(Option<String>, Fields)> = documents
        .into_iter()
        .map(|mut fields| {
            let id = fields.remove("id").map(|id| match id {
                Value::String(id) => id,
                other => other.to_string(),
            });
            (id, fields)
        })
        .collect();
    let mut taken: HashSet<String> = documents.iter().filter_map(|(id, _)| id.clone()).collect();
    Ok(documents
        .into_iter()
        .enumerate()
        .map(|(index, (id, fields))| {
            let id = id.unwrap_or_else(|| {
                let mut candidate = index.to_string();
                let mut suffix = 1;
                while taken.contains(&candidate) {
                    candidate = format!("{index}-{suffix}");
                    suffix += 1;
                }
                taken.insert(candidate.clone());
                candidate
            });
            Record::new(id, fields)
        })
        .collect())
}
