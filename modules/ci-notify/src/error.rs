use thiserror::Error;

use ci_events::StoreError;

use crate::templates::RenderError;

/// Errors surfaced to whoever drives the notifier. Per-event render and
/// delivery failures inside a batch are reported in the batch summary instead.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for NotifyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidLimit(_) => NotifyError::InvalidArgument(err.to_string()),
            StoreError::Unavailable { .. } => NotifyError::StoreUnavailable(err.to_string()),
        }
    }
}
