use thiserror::Error;

/// Errors surfaced to callers of the tracker.
///
/// Transient recognizer conditions (momentary silence, a session ending on
/// its own) are not errors; see `recognition::RecognitionStatus`.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("UNSUPPORTED_ENVIRONMENT: speech recognition is not available")]
    UnsupportedEnvironment,
    #[error("PERMISSION_DENIED: {0}")]
    PermissionDenied(String),
    #[error("RECOGNITION_FAILURE: {0}")]
    Recognition(String),
    #[error("STORAGE_FAILURE: {0}")]
    Storage(String),
    #[error("VALIDATION_FAILED: {0}")]
    Validation(String),
}

impl TrackerError {
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(value: anyhow::Error) -> Self {
        Self::Storage(format!("{value:#}"))
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

// JSON only crosses the boundary on the import path.
impl From<serde_json::Error> for TrackerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Validation(value.to_string())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
