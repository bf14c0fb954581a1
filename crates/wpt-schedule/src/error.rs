//! Error types for the schedule codec

/// Errors while decoding or encoding a schedule document
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Input is not valid JSON
    #[error("schedule is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Top-level value is not an object
    #[error("schedule document must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// Neither `data` nor `customTasks` holds an array
    #[error("schedule document has neither a `data` nor a `customTasks` array")]
    MissingTaskList,

    /// A task entry is not an object
    #[error("task at index {index} is not a JSON object")]
    TaskNotObject { index: usize },

    /// Serialization failed
    #[error("failed to serialize schedule: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
