//! Shared types for the agent memory service and the dashboard that consumes it.
//!
//! The memory document is shared with the voice agent, so the persisted field
//! names (`task`, `note`, `added`, `time`) follow the agent's format.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =====================================================
// Domain Types
// =====================================================

/// A task record. Deserialization never fails on a single record: the
/// voice agent and older builds of the API wrote loosely typed values, and
/// rejecting one record would drop the whole file on the next save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Task {
    #[serde(rename = "task")]
    pub text: String,
    pub done: bool,
    pub added: String,
    /// Keys written by other tools, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(text: impl Into<String>, added: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
            added: added.into(),
            extra: Map::new(),
        }
    }
}

impl From<Value> for Task {
    fn from(value: Value) -> Self {
        let mut fields = into_fields(value, "task");
        Self {
            text: take_text(&mut fields, "task"),
            done: fields.remove("done").is_some_and(|v| is_truthy(&v)),
            added: take_text(&mut fields, "added"),
            extra: fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Note {
    #[serde(rename = "note")]
    pub text: String,
    pub time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    pub fn new(text: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time: time.into(),
            extra: Map::new(),
        }
    }
}

impl From<Value> for Note {
    fn from(value: Value) -> Self {
        let mut fields = into_fields(value, "note");
        Self {
            text: take_text(&mut fields, "note"),
            time: take_text(&mut fields, "time"),
            extra: fields,
        }
    }
}

/// A bare value in place of a record object becomes the record's text.
fn into_fields(value: Value, text_key: &str) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => Map::from_iter([(text_key.to_string(), other)]),
    }
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
    match fields.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Truthiness as the dashboard and the agent read `done`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The whole persisted memory file.
///
/// Top-level keys other than `tasks` and `notes` belong to the voice agent
/// and are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: Vec<Note>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// =====================================================
// Positional Identity
// =====================================================

/// Resolve a raw path segment to a position inside a sequence of `len` items.
///
/// Records are addressed by their current index, not a stable id. Anything
/// that is not a non-negative integer below `len` resolves to `None`.
pub fn resolve_index(raw: &str, len: usize) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&i| i < len)
}

impl Document {
    pub fn pending_tasks(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| !t.done).cloned().collect()
    }

    pub fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn push_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn task_position(&self, raw: &str) -> Option<usize> {
        resolve_index(raw, self.tasks.len())
    }

    pub fn note_position(&self, raw: &str) -> Option<usize> {
        resolve_index(raw, self.notes.len())
    }

    /// Set `done` on the task at `index`. Returns the updated task, or `None`
    /// when the index is out of range.
    pub fn set_task_done(&mut self, index: usize, done: bool) -> Option<&Task> {
        let task = self.tasks.get_mut(index)?;
        task.done = done;
        Some(task)
    }

    /// Remove the task at `index`; later tasks shift down by one.
    pub fn remove_task(&mut self, index: usize) -> Option<Task> {
        (index < self.tasks.len()).then(|| self.tasks.remove(index))
    }

    /// Remove the note at `index`; later notes shift down by one.
    pub fn remove_note(&mut self, index: usize) -> Option<Note> {
        (index < self.notes.len()).then(|| self.notes.remove(index))
    }

    pub fn stats(&self) -> MemoryStats {
        let completed = self.tasks.iter().filter(|t| t.done).count();
        MemoryStats {
            total_tasks: self.tasks.len(),
            completed_tasks: completed,
            pending_tasks: self.tasks.len() - completed,
            total_notes: self.notes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub total_notes: usize,
}

// =====================================================
// Request Types
// =====================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddNoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub done: Option<bool>,
}

// =====================================================
// Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted<T> {
    pub deleted: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub port: u16,
}
