//! Schedule tasks
//!
//! A task is kept as the raw JSON object the chart editor produced. Typed
//! accessors read the fields the reconciliation cares about; everything else
//! passes through rewrites untouched.

use crate::error::ScheduleError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task type as written by the chart editor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Plain task
    Task,
    /// Summary task grouping children
    Project,
    /// Zero-length marker
    Milestone,
    /// Anything else the editor emitted
    Other(String),
}

impl TaskKind {
    /// Parse the `type` field
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "task" => Self::Task,
            "project" => Self::Project,
            "milestone" => Self::Milestone,
            other => Self::Other(other.to_string()),
        }
    }

    /// Field value as written to JSON
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Milestone => "milestone",
            Self::Other(s) => s,
        }
    }
}

/// One task inside a schedule document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleTask {
    fields: Map<String, Value>,
}

impl ScheduleTask {
    /// Wrap an existing JSON object
    #[inline]
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wrap a JSON value, which must be an object
    ///
    /// # Errors
    /// [`ScheduleError::TaskNotObject`] for any other JSON type.
    pub fn from_value(value: Value, index: usize) -> Result<Self, ScheduleError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ScheduleError::TaskNotObject { index }),
        }
    }

    /// Build a task with the given id and name
    #[must_use]
    pub fn new(id: impl Into<Value>, text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), id.into());
        fields.insert("text".to_string(), Value::String(text.into()));
        Self { fields }
    }

    /// Set an arbitrary field (builder style)
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Raw fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw field by name
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Convert back into a JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Stringified `id`, the join key towards activity rows
    #[must_use]
    pub fn key(&self) -> Option<String> {
        self.fields.get("id").and_then(stringify_id)
    }

    /// Stringified `parent`, `None` for root-level tasks
    #[must_use]
    pub fn parent_key(&self) -> Option<String> {
        self.fields.get("parent").and_then(stringify_id)
    }

    /// Display name
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    /// Task type, if present
    #[must_use]
    pub fn kind(&self) -> Option<TaskKind> {
        self.fields
            .get("type")
            .and_then(Value::as_str)
            .map(TaskKind::parse)
    }

    /// Whether the task is a main activity
    ///
    /// Either `type == "project"` or a truthy legacy `isMainActivity` flag.
    #[must_use]
    pub fn is_main_activity(&self) -> bool {
        self.kind() == Some(TaskKind::Project)
            || self.fields.get("isMainActivity").is_some_and(is_truthy)
    }

    /// Completion fraction in `[0, 1]`, if set
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        self.fields.get("progress").and_then(as_number)
    }

    /// Overwrite the completion fraction
    pub fn set_progress(&mut self, fraction: f64) {
        self.fields.insert("progress".to_string(), Value::from(fraction));
    }

    /// Start date, copied as text
    #[must_use]
    pub fn start_date(&self) -> Option<String> {
        self.fields.get("start_date").and_then(as_text)
    }

    /// End date, copied as text
    #[must_use]
    pub fn end_date(&self) -> Option<String> {
        self.fields.get("end_date").and_then(as_text)
    }

    /// Duration in schedule units
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.fields.get("duration").and_then(as_number)
    }
}

/// Render a task id the way the editor's string conversion does
///
/// Integral numbers render without a fractional part (`1.0` -> `"1"`).
/// `null`, arrays and objects have no key.
#[must_use]
pub fn stringify_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(render_float)
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn render_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
