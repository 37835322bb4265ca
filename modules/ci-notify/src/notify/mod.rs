//! Delivery of rendered messages to the chat endpoint.

pub mod backend;
pub mod result;
pub mod slack;

pub use backend::NotifyBackend;
pub use result::{DispatchError, DispatchResult};
pub use slack::{send, validate_endpoint, SlackWebhook, DEFAULT_TIMEOUT};
