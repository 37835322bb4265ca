use std::fmt;

use thiserror::Error;

/// Why a single delivery attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Outcome of one delivery attempt, handed back to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
    pub status: Option<u16>,
}

impl DispatchResult {
    pub fn delivered(status: u16) -> Self {
        Self {
            success: true,
            message: format!("Message delivered (HTTP {status})"),
            status: Some(status),
        }
    }

    pub fn failed(error: &DispatchError) -> Self {
        let status = match error {
            DispatchError::Status { status, .. } => Some(*status),
            _ => None,
        };
        Self {
            success: false,
            message: error.to_string(),
            status,
        }
    }
}

impl From<Result<u16, DispatchError>> for DispatchResult {
    fn from(result: Result<u16, DispatchError>) -> Self {
        match result {
            Ok(status) => Self::delivered(status),
            Err(e) => Self::failed(&e),
        }
    }
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
