use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::backend::NotifyBackend;
use super::result::{DispatchError, DispatchResult};

/// Upper bound on a single POST, connect included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of an error response body ends up in the result message.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
    mrkdwn: bool,
}

/// Check that the endpoint is a usable absolute http(s) URL.
pub fn validate_endpoint(endpoint: Option<&str>) -> Result<Url, DispatchError> {
    let raw = endpoint
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            DispatchError::Configuration("SLACK_WEBHOOK_URL is not set".to_string())
        })?;

    let url = Url::parse(raw).map_err(|e| {
        DispatchError::Configuration(format!("webhook endpoint is not an absolute URL: {e}"))
    })?;

    let is_http = matches!(url.scheme(), "http" | "https");
    if !is_http || !url.has_host() {
        return Err(DispatchError::Configuration(format!(
            "webhook endpoint must be an http(s) URL with a host, got scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

/// Post `message` to `endpoint` once. Never panics and never retries; every
/// failure is reported through the returned [`DispatchResult`].
pub async fn send(http: &reqwest::Client, message: &str, endpoint: Option<&str>) -> DispatchResult {
    let result = post(http, message, endpoint).await;
    match &result {
        Ok(status) => info!(status, "Notification delivered"),
        Err(e) => warn!(error = %e, "Notification not delivered"),
    }
    result.into()
}

async fn post(
    http: &reqwest::Client,
    message: &str,
    endpoint: Option<&str>,
) -> Result<u16, DispatchError> {
    let url = validate_endpoint(endpoint)?;
    // The full URL carries the webhook secret; only the host is safe to log.
    debug!(
        host = url.host_str().unwrap_or_default(),
        bytes = message.len(),
        "Posting notification"
    );

    let payload = SlackPayload {
        text: message,
        mrkdwn: true,
    };
    let resp = http
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(describe_transport)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DispatchError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    Ok(status.as_u16())
}

fn describe_transport(err: reqwest::Error) -> DispatchError {
    let err = err.without_url();
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };

    let mut message = format!("{kind}: {err}");
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    DispatchError::Transport(message)
}

/// Slack incoming-webhook backend.
pub struct SlackWebhook {
    endpoint: Option<String>,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    fn ensure_configured(&self) -> Result<(), DispatchError> {
        validate_endpoint(self.endpoint.as_deref()).map(|_| ())
    }

    async fn dispatch(&self, message: &str) -> DispatchResult {
        send(&self.http, message, self.endpoint.as_deref()).await
    }
}
