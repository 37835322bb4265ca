use async_trait::async_trait;

use super::result::{DispatchError, DispatchResult};

/// Pluggable delivery backend for rendered notifications.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Whether the backend can deliver at all. Checked once per batch, before
    /// any message is sent.
    fn ensure_configured(&self) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Deliver one message. Failures come back in the result, never as a panic.
    async fn dispatch(&self, message: &str) -> DispatchResult;
}
