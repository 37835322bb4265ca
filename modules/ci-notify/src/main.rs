use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ci_events::{JsonFileStore, Outcome};
use ci_notify::{BatchPolicy, Config, Notifier, SlackWebhook};

#[derive(Parser)]
#[command(name = "ci-notify", about = "Post captured CI events to a chat webhook")]
#[command(version)]
struct Cli {
    /// Event store file written by the webhook receiver (overrides CI_EVENTS_PATH)
    #[arg(long, global = true)]
    events: Option<PathBuf>,

    /// HTTP timeout in seconds (overrides NOTIFY_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the most recent captured events as JSON
    Events {
        #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Print the latest run of each workflow as JSON
    Status {
        /// Only this workflow
        #[arg(short, long)]
        workflow: Option<String>,
    },

    /// Render a failure alert (by event id, or the most recent failure)
    Alert {
        #[arg(long)]
        id: Option<String>,
    },

    /// Render a success summary (by event id, or the most recent success)
    Summary {
        #[arg(long)]
        id: Option<String>,
    },

    /// Post a message to the configured webhook as-is
    Send { message: String },

    /// Render and post notifications for recent events
    Notify {
        #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
        limit: i64,

        /// Only events with this outcome (success, failure, pending)
        #[arg(long)]
        only: Option<Outcome>,

        /// Notify every matching event instead of just the most recent one
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries command output only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ci_notify=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.events {
        config.events_path = path;
    }
    if let Some(secs) = cli.timeout {
        anyhow::ensure!(secs > 0, "--timeout must be greater than zero");
        config.timeout = Duration::from_secs(secs);
    }
    config.log_redacted();

    let store = JsonFileStore::new(config.events_path.clone());
    let backend = SlackWebhook::new(config.slack_webhook_url.clone(), config.timeout)?;
    let batch = match &cli.command {
        Commands::Notify { all: true, .. } => BatchPolicy::All,
        _ => config.batch,
    };
    let notifier = Notifier::new(Box::new(store), Box::new(backend))
        .with_context(config.template_context())
        .with_batch_policy(batch);

    match cli.command {
        Commands::Events { limit } => {
            println!("{}", notifier.list_recent_events(limit).await?);
        }
        Commands::Status { workflow } => {
            println!("{}", notifier.workflow_status(workflow.as_deref()).await?);
        }
        Commands::Alert { id } => {
            let event = pick_event(&notifier, id.as_deref(), Outcome::Failure).await?;
            println!("{}", notifier.render_alert(&event)?);
        }
        Commands::Summary { id } => {
            let event = pick_event(&notifier, id.as_deref(), Outcome::Success).await?;
            println!("{}", notifier.render_summary(&event)?);
        }
        Commands::Send { message } => {
            let result = notifier.dispatch(&message).await;
            println!("{result}");
            if !result.success {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Notify { limit, only, .. } => {
            let report = notifier.notify_recent(limit, only).await?;
            println!("{report}");
            if report.failed() > 0 {
                return Ok(ExitCode::from(1));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn pick_event(
    notifier: &Notifier,
    id: Option<&str>,
    outcome: Outcome,
) -> Result<ci_events::EventRecord> {
    let event = match id {
        Some(id) => notifier.find_event(id).await?,
        None => notifier.latest_with_outcome(outcome).await?,
    };
    match (event, id) {
        (Some(event), _) => {
            info!(event_id = %event.id, outcome = %event.outcome, "Selected event");
            Ok(event)
        }
        (None, Some(id)) => bail!("No event with id '{id}' in the event store"),
        (None, None) => bail!("No {outcome} events in the event store"),
    }
}
