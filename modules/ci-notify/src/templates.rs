//! Chat message templates, one per outcome classification.
//!
//! Output uses Slack mrkdwn: `*bold*` with single asterisks, `<url|text>`
//! links, and an emoji on both sides of the title. Lines for optional fields
//! that the event does not carry are dropped entirely.

use thiserror::Error;

use ci_events::{present, EventRecord, Outcome};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("No template for outcome '{0}'")]
    UnsupportedOutcome(Outcome),

    #[error("Missing field '{0}' required by template")]
    MissingField(&'static str),
}

/// Values that come from configuration rather than from the event.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Mention appended as a `cc` line, e.g. `@platform-team`.
    pub team: Option<String>,
    /// Used when the event does not name its repository.
    pub default_repository: Option<String>,
}

/// Named values a template cannot be rendered without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Workflow,
    Branch,
    Repository,
}

impl Placeholder {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Branch => "branch",
            Self::Repository => "repository",
        }
    }

    fn resolve<'a>(&self, event: &'a EventRecord, ctx: &'a TemplateContext) -> Option<&'a str> {
        match self {
            Self::Workflow => present(&event.workflow),
            Self::Branch => present(&event.branch),
            Self::Repository => {
                present(&event.repository).or_else(|| present(&ctx.default_repository))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    FailureAlert,
    SuccessSummary,
    PendingNotice,
}

impl Template {
    pub const ALL: [Template; 3] = [
        Template::FailureAlert,
        Template::SuccessSummary,
        Template::PendingNotice,
    ];

    /// The classification this template is bound to.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::FailureAlert => Outcome::Failure,
            Self::SuccessSummary => Outcome::Success,
            Self::PendingNotice => Outcome::Pending,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FailureAlert => "CI Failure Alert",
            Self::SuccessSummary => "Deployment Successful",
            Self::PendingNotice => "CI Run In Progress",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::FailureAlert => ":rotating_light:",
            Self::SuccessSummary => ":white_check_mark:",
            Self::PendingNotice => ":hourglass_flowing_sand:",
        }
    }

    /// Placeholders that must resolve, in the order they appear.
    pub fn placeholders(&self) -> &'static [Placeholder] {
        match self {
            Self::FailureAlert => &[Placeholder::Workflow, Placeholder::Branch],
            Self::SuccessSummary => &[Placeholder::Repository],
            Self::PendingNotice => &[Placeholder::Workflow],
        }
    }

    fn header(&self) -> String {
        let emoji = self.emoji();
        format!("{emoji} *{}* {emoji}", self.title())
    }

    /// Render `event` with this template. Does not check the event's outcome;
    /// selection by outcome happens in [`TemplateSet::select`].
    pub fn render(&self, event: &EventRecord, ctx: &TemplateContext) -> Result<String, RenderError> {
        for placeholder in self.placeholders() {
            if placeholder.resolve(event, ctx).is_none() {
                return Err(RenderError::MissingField(placeholder.name()));
            }
        }

        let lines = match self {
            Self::FailureAlert => failure_alert(self.header(), event, ctx),
            Self::SuccessSummary => success_summary(self.header(), event, ctx),
            Self::PendingNotice => pending_notice(self.header(), event, ctx),
        };
        Ok(lines.join("\n"))
    }
}

/// The templates available at runtime. Fixed once the process starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            templates: Template::ALL.to_vec(),
        }
    }
}

impl TemplateSet {
    pub fn only(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut set = Vec::new();
        for template in templates {
            if !set.contains(&template) {
                set.push(template);
            }
        }
        Self { templates: set }
    }

    pub fn contains(&self, template: Template) -> bool {
        self.templates.contains(&template)
    }

    pub fn select(&self, outcome: Outcome) -> Result<Template, RenderError> {
        self.templates
            .iter()
            .copied()
            .find(|t| t.outcome() == outcome)
            .ok_or(RenderError::UnsupportedOutcome(outcome))
    }
}

/// Pick the template for the event's outcome and render it.
pub fn render(
    event: &EventRecord,
    templates: &TemplateSet,
    ctx: &TemplateContext,
) -> Result<String, RenderError> {
    templates.select(event.outcome)?.render(event, ctx)
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

fn failure_alert(header: String, event: &EventRecord, ctx: &TemplateContext) -> Vec<String> {
    let mut lines = vec![header, String::new(), "A CI workflow has failed:".to_string()];
    push_field(&mut lines, "Workflow", present(&event.workflow));
    push_field(&mut lines, "Branch", present(&event.branch));
    push_field(&mut lines, "Repository", Placeholder::Repository.resolve(event, ctx));
    push_commit(&mut lines, event);
    lines.push("*Status*: Failed".to_string());

    let failed = event.tasks_with(Outcome::Failure);
    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(|n| escape(n)).collect();
        lines.push(format!("*Failed jobs*: {}", names.join(", ")));
    }

    push_field(&mut lines, "Details", present(&event.description));
    push_link(&mut lines, "View Details", present(&event.log_url), "View Logs");
    lines.push(String::new());
    lines.push("Please check the logs and address any issues.".to_string());
    push_team(&mut lines, ctx);
    lines
}

fn success_summary(header: String, event: &EventRecord, ctx: &TemplateContext) -> Vec<String> {
    let repository = Placeholder::Repository.resolve(event, ctx).unwrap_or_default();
    let mut lines = vec![
        header,
        String::new(),
        format!("Deployment completed successfully for {}", escape(repository)),
    ];
    push_field(&mut lines, "Branch", present(&event.branch));
    push_commit(&mut lines, event);

    let changes: Vec<&str> = event
        .tasks
        .iter()
        .map(|t| t.name.trim())
        .filter(|n| !n.is_empty())
        .collect();
    if !changes.is_empty() {
        lines.push(String::new());
        lines.push("*Changes:*".to_string());
        lines.extend(changes.iter().map(|c| format!("- {}", escape(c))));
    }

    let mut links = Vec::new();
    push_link(&mut links, "Pull Request", present(&event.pr_url), "View Changes");
    push_link(&mut links, "View Details", present(&event.log_url), "View Logs");
    if !links.is_empty() {
        if !changes.is_empty() {
            lines.push(String::new());
        }
        lines.extend(links);
    }

    push_team(&mut lines, ctx);
    lines
}

fn pending_notice(header: String, event: &EventRecord, ctx: &TemplateContext) -> Vec<String> {
    let mut lines = vec![header, String::new()];
    push_field(&mut lines, "Workflow", present(&event.workflow));
    push_field(&mut lines, "Branch", present(&event.branch));
    push_field(&mut lines, "Repository", Placeholder::Repository.resolve(event, ctx));
    push_field(&mut lines, "Details", present(&event.description));
    push_link(&mut lines, "View Details", present(&event.log_url), "View Logs");
    lines
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("*{label}*: {}", escape(value)));
    }
}

fn push_link(lines: &mut Vec<String>, label: &str, url: Option<&str>, text: &str) {
    if let Some(url) = url {
        lines.push(format!("*{label}*: <{url}|{text}>"));
    }
}

fn push_commit(lines: &mut Vec<String>, event: &EventRecord) {
    if let Some(commit) = event.short_commit() {
        lines.push(format!("*Commit*: `{}`", escape(commit)));
    }
}

fn push_team(lines: &mut Vec<String>, ctx: &TemplateContext) {
    if let Some(team) = present(&ctx.team) {
        lines.push(format!("cc {team}"));
    }
}

/// Slack treats `&`, `<` and `>` as control characters in message text.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
