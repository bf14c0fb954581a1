//! Schedule documents
//!
//! Two document shapes exist in stored data:
//! - `{ "data": [...], "links": [...] }` written by the current chart editor
//! - `{ "customTasks": [...] }` written by the first editor generation
//!
//! The shape is detected once in [`ScheduleDocument::decode`]. Every rewrite
//! produces the `data` shape.

use crate::error::{json_type_name, ScheduleError};
use crate::task::ScheduleTask;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Key holding the task array in current documents
pub const DATA_KEY: &str = "data";

/// Key holding the task array in legacy documents
pub const LEGACY_TASKS_KEY: &str = "customTasks";

/// Which key the task list was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentShape {
    /// Tasks under `data`
    Gantt,
    /// Tasks under `customTasks`
    Legacy,
}

impl DocumentShape {
    /// Detect the shape of a top-level object
    ///
    /// `customTasks` wins when both keys hold arrays.
    #[must_use]
    pub fn detect(root: &Map<String, Value>) -> Option<Self> {
        if root.get(LEGACY_TASKS_KEY).is_some_and(Value::is_array) {
            Some(Self::Legacy)
        } else if root.get(DATA_KEY).is_some_and(Value::is_array) {
            Some(Self::Gantt)
        } else {
            None
        }
    }

    /// Key the task list lives under
    #[inline]
    #[must_use]
    pub fn tasks_key(self) -> &'static str {
        match self {
            Self::Gantt => DATA_KEY,
            Self::Legacy => LEGACY_TASKS_KEY,
        }
    }
}

/// Decoded schedule document
///
/// `root` keeps every top-level key in its original order; the task array
/// inside it is stale once decoded and `tasks` is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDocument {
    shape: DocumentShape,
    root: Map<String, Value>,
    tasks: Vec<ScheduleTask>,
}

impl ScheduleDocument {
    /// New `data`-shaped document with no other keys
    #[must_use]
    pub fn new(tasks: Vec<ScheduleTask>) -> Self {
        let mut root = Map::new();
        root.insert(DATA_KEY.to_string(), Value::Array(Vec::new()));
        Self {
            shape: DocumentShape::Gantt,
            root,
            tasks,
        }
    }

    /// Decode a persisted string
    ///
    /// # Errors
    /// See [`ScheduleError`].
    pub fn decode(raw: Option<&str>) -> Result<Option<Self>, ScheduleError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };

        let value: Value = serde_json::from_str(raw).map_err(ScheduleError::InvalidJson)?;
        Self::from_value(value).map(Some)
    }

    /// Decode an already parsed JSON value
    ///
    /// # Errors
    /// See [`ScheduleError`].
    pub fn from_value(value: Value) -> Result<Self, ScheduleError> {
        let root = match value {
            Value::Object(root) => root,
            other => return Err(ScheduleError::NotAnObject(json_type_name(&other))),
        };

        let shape = DocumentShape::detect(&root).ok_or(ScheduleError::MissingTaskList)?;
        let tasks = match root.get(shape.tasks_key()) {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .enumerate()
                .map(|(index, item)| ScheduleTask::from_value(item, index))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Self { shape, root, tasks })
    }

    /// Shape the document was read in
    #[inline]
    #[must_use]
    pub fn shape(&self) -> DocumentShape {
        self.shape
    }

    /// Task list, in display order
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[ScheduleTask] {
        &self.tasks
    }

    /// Mutable task list
    #[inline]
    pub fn tasks_mut(&mut self) -> &mut Vec<ScheduleTask> {
        &mut self.tasks
    }

    /// Top-level field other than the task list
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        if key == self.shape.tasks_key() {
            return None;
        }
        self.root.get(key)
    }

    /// Replace the task list, switching to the `data` shape
    ///
    /// A legacy `customTasks` key is renamed to `data` in place so it cannot
    /// shadow the rewritten tasks on the next read.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<ScheduleTask>) -> Self {
        if self.shape == DocumentShape::Legacy {
            let mut root = Map::with_capacity(self.root.len());
            for (key, value) in std::mem::take(&mut self.root) {
                if key == LEGACY_TASKS_KEY {
                    root.insert(DATA_KEY.to_string(), Value::Array(Vec::new()));
                } else if key != DATA_KEY {
                    root.insert(key, value);
                }
            }
            self.root = root;
            self.shape = DocumentShape::Gantt;
        }
        self.tasks = tasks;
        self
    }

    /// Rebuild the JSON value, tasks under the document's own key
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut root = self.root.clone();
        let tasks = self
            .tasks
            .iter()
            .cloned()
            .map(ScheduleTask::into_value)
            .collect();
        root.insert(self.shape.tasks_key().to_string(), Value::Array(tasks));
        Value::Object(root)
    }

    /// Serialize to a JSON string
    ///
    /// # Errors
    /// [`ScheduleError::Serialize`] if serialization fails.
    pub fn encode(&self) -> Result<String, ScheduleError> {
        serde_json::to_string(&self.to_value()).map_err(ScheduleError::Serialize)
    }
}

impl Serialize for ScheduleDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
