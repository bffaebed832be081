use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use coach_realtime::{
    ClientConfig, SessionService,
    api::{InterviewMood, InterviewSetup},
    core::realtime::{EventRouter, TransportEvent},
    core::tools::{ExecutorRegistry, ToolCompiler},
    core::transcript::Transcript,
};

/// Coach Realtime - interview coaching session client
#[derive(Parser, Debug)]
#[command(name = "coach-realtime")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SetupArgs {
    /// Candidate identifier
    #[arg(long = "talent-id")]
    talent_id: String,

    /// Job identifier
    #[arg(long = "job-id")]
    job_id: String,

    /// Interviewer mood (friendly, neutral, rude or 1-3)
    #[arg(long, default_value = "friendly", value_parser = parse_mood)]
    mood: InterviewMood,
}

impl SetupArgs {
    fn setup(&self) -> anyhow::Result<InterviewSetup> {
        InterviewSetup::new(self.mood, &self.talent_id, &self.job_id)
            .ok_or_else(|| anyhow!("Talent ID and job ID must not be blank"))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision a session and print the compiled tool definitions
    Tools {
        #[command(flatten)]
        setup: SetupArgs,
    },

    /// Replay recorded transport events and print the reconciled transcript
    Transcript {
        /// File with one transport event (JSON) per line
        #[arg(short = 'e', long = "events")]
        events: PathBuf,
    },

    /// Replay recorded transport events and generate an interview report
    Report {
        #[command(flatten)]
        setup: SetupArgs,

        /// File with one transport event (JSON) per line
        #[arg(short = 'e', long = "events")]
        events: PathBuf,
    },
}

fn parse_mood(s: &str) -> Result<InterviewMood, String> {
    InterviewMood::parse(s).ok_or_else(|| format!("unknown mood '{s}'"))
}

/// Feed every line of `path` through a fresh router.
fn replay_events(path: &Path) -> anyhow::Result<Transcript> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

    let transcript = Transcript::shared();
    let router = EventRouter::new(Arc::clone(&transcript));
    let mut count = 0usize;
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        router.route(TransportEvent::from_text(line));
        count += 1;
    }
    info!("Replayed {} events from {}", count, path.display());

    drop(router);
    Arc::try_unwrap(transcript)
        .map(|lock| lock.into_inner())
        .map_err(|_| anyhow!("Transcript still shared after replay"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = &cli.config {
        info!("Loading configuration from {}", config_path.display());
        ClientConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ClientConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command {
        Commands::Tools { setup } => {
            let service = SessionService::from_config(&config)?;
            let data = service.fetch_ephemeral_session(&setup.setup()?).await?;

            let registry = ExecutorRegistry::with_callbacks(
                Arc::new(|tip: &str| println!("Coaching tip: {tip}")),
                Arc::new(|| println!("Call ended")),
            );
            let tools = ToolCompiler::new(registry).compile(&data.tools);
            let definitions: Vec<_> = tools.iter().map(|t| t.definition()).collect();
            println!("{}", serde_json::to_string_pretty(&definitions)?);

            if let Some(audio) = &data.audio_config {
                println!("{}", serde_json::to_string_pretty(audio)?);
            }
        }
        Commands::Transcript { events } => {
            let transcript = replay_events(&events)?;
            println!("{}", serde_json::to_string_pretty(transcript.items())?);
        }
        Commands::Report { setup, events } => {
            let setup = setup.setup()?;
            let transcript = replay_events(&events)?;
            let service = SessionService::from_config(&config)?;

            let report = service
                .generate_report(&setup, transcript.to_report_turns())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("English level: {}", report.english_level());
        }
    }

    Ok(())
}
