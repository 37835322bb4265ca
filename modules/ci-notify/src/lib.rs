//! Reads captured CI events, renders them into chat messages and posts them
//! to a Slack-style incoming webhook.

pub mod config;
pub mod error;
pub mod notify;
pub mod templates;
pub mod workflow;

pub use config::Config;
pub use error::NotifyError;
pub use notify::{DispatchResult, NotifyBackend, SlackWebhook};
pub use templates::{Template, TemplateContext, TemplateSet};
pub use workflow::{BatchPolicy, NotifyReport, Notifier};
