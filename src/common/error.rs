use thiserror::Error;

/// Failures a screen can surface to the user. None of them are fatal; the
/// UI shows them as a notice and keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("permission denied for {capability}")]
    PermissionDenied { capability: String },
    #[error("{device} is unavailable")]
    DeviceUnavailable { device: String },
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("request timed out after {millis} ms")]
    Timeout { millis: u64 },
    #[error("{0} not found")]
    NotFound(String),
}

impl ScreenError {
    /// Whether retrying the same action can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScreenError::RequestFailed(_) | ScreenError::Timeout { .. }
        )
    }
}
