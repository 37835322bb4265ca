use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::notify::DEFAULT_TIMEOUT;
use crate::templates::TemplateContext;
use crate::workflow::BatchPolicy;

const DEFAULT_EVENTS_PATH: &str = "./events.json";

/// Notifier configuration loaded from environment variables.
/// The webhook URL is a secret and is never logged in full.
#[derive(Debug, Clone)]
pub struct Config {
    pub slack_webhook_url: Option<String>,
    pub events_path: PathBuf,
    pub timeout: Duration,
    pub team: Option<String>,
    pub default_repository: Option<String>,
    pub batch: BatchPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout = match get("NOTIFY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("NOTIFY_TIMEOUT_SECS must be a number, got '{raw}'"))?;
                anyhow::ensure!(secs > 0, "NOTIFY_TIMEOUT_SECS must be greater than zero");
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let batch = match get("NOTIFY_BATCH") {
            Some(raw) => raw.parse::<BatchPolicy>().map_err(anyhow::Error::msg)?,
            None => BatchPolicy::default(),
        };

        Ok(Self {
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            events_path: get("CI_EVENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENTS_PATH)),
            timeout,
            team: get("NOTIFY_TEAM"),
            default_repository: get("NOTIFY_DEFAULT_REPOSITORY"),
            batch,
        })
    }

    pub fn template_context(&self) -> TemplateContext {
        TemplateContext {
            team: self.team.clone(),
            default_repository: self.default_repository.clone(),
        }
    }

    pub fn log_redacted(&self) {
        let webhook = match &self.slack_webhook_url {
            Some(url) => match url::Url::parse(url) {
                Ok(parsed) => format!("{}://{}/...", parsed.scheme(), parsed.host_str().unwrap_or("?")),
                Err(_) => "<invalid>".to_string(),
            },
            None => "<not set>".to_string(),
        };

        tracing::info!("Config loaded:");
        tracing::info!("  SLACK_WEBHOOK_URL: {webhook}");
        tracing::info!("  CI_EVENTS_PATH: {}", self.events_path.display());
        tracing::info!("  NOTIFY_TIMEOUT_SECS: {}", self.timeout.as_secs());
        tracing::info!("  NOTIFY_BATCH: {}", self.batch);
    }
}
