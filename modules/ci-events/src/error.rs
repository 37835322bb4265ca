use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid limit {0}: must be a positive integer")]
    InvalidLimit(i64),

    #[error("Event store unavailable ({}): {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        StoreError::Unavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
