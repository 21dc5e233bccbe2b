use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewpress::api::{HttpJobApi, JobApi, TaskId};
use crewpress::terminal::TerminalView;
use crewpress::{Config, StartOutcome, TaskOutcome, TaskSession};

#[derive(Parser, Debug)]
#[command(name = "crewpress", version, about = "Generate articles with a crew of agents")]
struct Cli {
    /// Base URL of the generation server
    #[arg(long, global = true)]
    server: Option<String>,

    /// Directory for downloaded articles
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an article and follow its progress
    Generate {
        /// Article topic
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
        /// Save the finished article to the download directory
        #[arg(long)]
        download: bool,
        /// Copy the finished article to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Show the server-side status of a task
    Status { task_id: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "crewpress=debug,info"
    } else {
        "crewpress=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::resolve(cli.server, cli.download_dir)?;
    tracing::debug!("Using server {}", config.server_url);
    let api = HttpJobApi::new(config.server_url.clone());

    match cli.command {
        Command::Generate {
            topic,
            download,
            copy,
        } => generate(&config, api, &topic.join(" "), download, copy).await,
        Command::Status { task_id } => {
            let info = api.task_info(&TaskId::new(task_id)).await?;
            println!("task:      {}", info.task_id);
            println!("topic:     {}", info.topic);
            println!("status:    {}", info.status);
            println!("progress:  {} updates", info.progress_count);
            println!("created:   {}", info.created_at);
            if let Some(done) = info.completed_at {
                println!("completed: {}", done);
            }
            println!("article:   {}", if info.has_article { "yes" } else { "no" });
            Ok(())
        }
    }
}

async fn generate(
    config: &Config,
    api: HttpJobApi,
    topic: &str,
    download: bool,
    copy: bool,
) -> Result<()> {
    let transport = Arc::new(api.event_transport());
    let mut session = TaskSession::new(Arc::new(api), transport, TerminalView::stdout())
        .with_download_dir(config.download_dir.clone());

    match session.start(topic).await {
        StartOutcome::Ignored => anyhow::bail!("Topic is required"),
        StartOutcome::Rejected => anyhow::bail!("The server did not accept the job"),
        StartOutcome::Failed(task_id) => {
            anyhow::bail!("Could not follow progress of task {}", task_id)
        }
        StartOutcome::Streaming(task_id) => tracing::info!("Following task {}", task_id),
    }

    let outcome = tokio::select! {
        outcome = session.run() => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(outcome) = outcome else {
        tracing::info!("Interrupted, closing progress stream");
        session.teardown();
        return Ok(());
    };

    match outcome {
        TaskOutcome::Completed(_) => {
            if download {
                session.download_article().await;
            }
            if copy {
                session.copy_article();
            }
            Ok(())
        }
        TaskOutcome::Failed { message, .. } => anyhow::bail!("Generation failed: {}", message),
        TaskOutcome::Pending(task_id) => anyhow::bail!("Task {} did not finish", task_id),
        TaskOutcome::NoTask => Ok(()),
    }
}
