//! The notifier: read recent events, render them, deliver them, report back.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info, warn};

use ci_events::{latest_by_workflow, present, validate_limit, EventRecord, EventSource, Outcome};

use crate::error::NotifyError;
use crate::notify::{DispatchResult, NotifyBackend};
use crate::templates::{self, RenderError, Template, TemplateContext, TemplateSet};

/// How far back lookups by id and per-workflow status reach.
const SCAN_LIMIT: usize = 100;

/// Which matching events a batch notification covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Only the single most recent matching event.
    #[default]
    Latest,
    /// Every matching event within the limit, newest first.
    All,
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::All => write!(f, "all"),
        }
    }
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "all" => Ok(Self::All),
            other => Err(format!("unknown batch policy '{other}' (expected latest or all)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryResult {
    /// A delivery was attempted; the result says whether it landed.
    Dispatched(DispatchResult),
    /// The event could not be rendered, so nothing was sent for it.
    Skipped(RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub event_id: String,
    pub outcome: Outcome,
    pub result: EntryResult,
}

/// Summary of one `notify_recent` call. `Display` is the caller-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    /// Events read from the store before filtering.
    pub considered: usize,
    pub filter: Option<Outcome>,
    pub entries: Vec<ReportEntry>,
}

impl NotifyReport {
    pub fn is_noop(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sent(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.result, EntryResult::Dispatched(r) if r.success))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.sent()
    }
}

impl fmt::Display for NotifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return match (self.considered, self.filter) {
                (0, _) => write!(f, "Nothing to report: no events captured yet"),
                (n, Some(outcome)) => write!(
                    f,
                    "Nothing to report: no {outcome} events among the {n} most recent"
                ),
                (n, None) => write!(f, "Nothing to report: {n} events considered"),
            };
        }

        write!(
            f,
            "Dispatched {}/{} notifications",
            self.sent(),
            self.entries.len()
        )?;
        for entry in &self.entries {
            write!(f, "\n- {} ({}): ", entry.event_id, entry.outcome)?;
            match &entry.result {
                EntryResult::Dispatched(r) if r.success => match r.status {
                    Some(status) => write!(f, "sent (HTTP {status})")?,
                    None => write!(f, "sent")?,
                },
                EntryResult::Dispatched(r) => write!(f, "failed: {}", r.message)?,
                EntryResult::Skipped(e) => write!(f, "skipped: {e}")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowStatus<'a> {
    workflow: &'a str,
    outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_url: Option<&'a str>,
    timestamp: String,
}

/// Sequences store read, template render and delivery.
pub struct Notifier {
    store: Box<dyn EventSource>,
    backend: Box<dyn NotifyBackend>,
    templates: TemplateSet,
    context: TemplateContext,
    batch: BatchPolicy,
}

impl Notifier {
    pub fn new(store: Box<dyn EventSource>, backend: Box<dyn NotifyBackend>) -> Self {
        Self {
            store,
            backend,
            templates: TemplateSet::default(),
            context: TemplateContext::default(),
            batch: BatchPolicy::default(),
        }
    }

    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_context(mut self, context: TemplateContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_batch_policy(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    /// Most recent events as pretty-printed JSON, newest first.
    pub async fn list_recent_events(&self, limit: i64) -> Result<String, NotifyError> {
        let limit = validate_limit(limit)?;
        let events = self.store.recent(limit).await?;
        Ok(serde_json::to_string_pretty(&events)?)
    }

    /// Latest run of each workflow as pretty-printed JSON, optionally narrowed
    /// to one workflow name (case-insensitive).
    pub async fn workflow_status(&self, workflow: Option<&str>) -> Result<String, NotifyError> {
        let events = self.store.recent(SCAN_LIMIT).await?;
        let latest = latest_by_workflow(&events);

        let statuses: Vec<WorkflowStatus<'_>> = latest
            .iter()
            .filter_map(|e| {
                let name = present(&e.workflow)?;
                Some(WorkflowStatus {
                    workflow: name,
                    outcome: e.outcome,
                    branch: present(&e.branch),
                    log_url: present(&e.log_url),
                    timestamp: e.timestamp.to_rfc3339(),
                })
            })
            .filter(|s| workflow.map_or(true, |w| s.workflow.eq_ignore_ascii_case(w.trim())))
            .collect();

        Ok(serde_json::to_string_pretty(&statuses)?)
    }

    pub async fn find_event(&self, id: &str) -> Result<Option<EventRecord>, NotifyError> {
        let events = self.store.recent(SCAN_LIMIT).await?;
        Ok(events.into_iter().find(|e| e.id == id))
    }

    pub async fn latest_with_outcome(
        &self,
        outcome: Outcome,
    ) -> Result<Option<EventRecord>, NotifyError> {
        let events = self.store.recent(SCAN_LIMIT).await?;
        Ok(events.into_iter().find(|e| e.outcome == outcome))
    }

    /// Failure alert for `event`. Fails if the event is not a failure.
    pub fn render_alert(&self, event: &EventRecord) -> Result<String, RenderError> {
        self.render_with(Template::FailureAlert, event)
    }

    /// Success summary for `event`. Fails if the event is not a success.
    pub fn render_summary(&self, event: &EventRecord) -> Result<String, RenderError> {
        self.render_with(Template::SuccessSummary, event)
    }

    /// Template chosen by the event's own outcome.
    pub fn render(&self, event: &EventRecord) -> Result<String, RenderError> {
        templates::render(event, &self.templates, &self.context)
    }

    fn render_with(&self, template: Template, event: &EventRecord) -> Result<String, RenderError> {
        if event.outcome != template.outcome() || !self.templates.contains(template) {
            return Err(RenderError::UnsupportedOutcome(event.outcome));
        }
        template.render(event, &self.context)
    }

    pub async fn dispatch(&self, message: &str) -> DispatchResult {
        self.backend.dispatch(message).await
    }

    /// Notify about recent events, optionally only those with `filter` outcome.
    ///
    /// Invalid limits, an unreadable store and missing delivery configuration
    /// abort the call. Render and delivery failures are per event and end up
    /// in the report without stopping the rest of the batch.
    pub async fn notify_recent(
        &self,
        limit: i64,
        filter: Option<Outcome>,
    ) -> Result<NotifyReport, NotifyError> {
        let limit = validate_limit(limit)?;
        let events = self.store.recent(limit).await?;
        let considered = events.len();

        let mut matching: Vec<EventRecord> = events
            .into_iter()
            .filter(|e| filter.map_or(true, |f| e.outcome == f))
            .collect();

        let mut report = NotifyReport {
            considered,
            filter,
            entries: Vec::new(),
        };

        if matching.is_empty() {
            info!(considered, filter = ?filter, "No matching events, nothing to notify");
            return Ok(report);
        }

        self.backend
            .ensure_configured()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;

        if self.batch == BatchPolicy::Latest {
            matching.truncate(1);
        }
        debug!(count = matching.len(), batch = %self.batch, "Processing events");

        for event in &matching {
            let result = match self.render(event) {
                Ok(message) => EntryResult::Dispatched(self.backend.dispatch(&message).await),
                Err(e) => {
                    warn!(event_id = %event.id, outcome = %event.outcome, error = %e, "Skipping event");
                    EntryResult::Skipped(e)
                }
            };
            report.entries.push(ReportEntry {
                event_id: event.id.clone(),
                outcome: event.outcome,
                result,
            });
        }

        info!(
            sent = report.sent(),
            failed = report.failed(),
            "Notification batch complete"
        );
        Ok(report)
    }
}
