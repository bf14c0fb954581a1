//! Uniform operation result
//!
//! Every synchronizer operation answers with an [`OperationResult`]; failures
//! are values, never panics.

use crate::error::{ErrorKind, SyncError};
use serde::{Deserialize, Serialize};

/// Soft failure attached to a successful primary write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    pub kind: ErrorKind,
    pub message: String,
}

impl SyncWarning {
    /// Warning for a failed derivative sync
    #[must_use]
    pub fn partial_sync(error: &SyncError) -> Self {
        Self {
            kind: ErrorKind::PartialSyncFailure,
            message: error.to_string(),
        }
    }
}

/// `{ success, data?, error?, error_kind?, warning? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<SyncWarning>,
}

impl<T> OperationResult<T> {
    /// Successful result
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            warning: None,
        }
    }

    /// Failed result
    #[must_use]
    pub fn failed(error: &SyncError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            warning: None,
        }
    }

    /// With an optional warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: Option<SyncWarning>) -> Self {
        self.warning = warning;
        self
    }

    /// From a result whose success may carry a warning
    #[must_use]
    pub fn from_warned(result: Result<(T, Option<SyncWarning>), SyncError>) -> Self {
        match result {
            Ok((data, warning)) => Self::ok(data).with_warning(warning),
            Err(error) => Self::failed(&error),
        }
    }

    /// Whether a warning is attached
    #[inline]
    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// Convert into a plain `Result`, dropping any warning
    ///
    /// # Errors
    /// The error message of a failed result.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "operation failed".to_string())),
        }
    }
}

impl<T> From<Result<T, SyncError>> for OperationResult<T> {
    fn from(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failed(&error),
        }
    }
}
