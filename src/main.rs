use clap::Parser;
use swingwatch::application::stats::EngineSummary;
use swingwatch::cli::commands::{Cli, Commands};
use swingwatch::config::EngineConfig;
use swingwatch::domain::ports::signal_repository::SignalFilter;
use swingwatch::domain::values::confidence::ConfidencePolicy;
use swingwatch::domain::values::signal_state::SignalState;
use swingwatch::infrastructure::feeds::json_lines::JsonLinesFeed;
use swingwatch::infrastructure::feeds::BarFeed;
use swingwatch::SwingWatch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swingwatch=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run_command(&cli.db, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(db_path: &str, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run {
            input,
            windows,
            policy,
            no_updates,
            fresh,
        } => {
            let policy: ConfidencePolicy = policy.parse()?;
            let config = EngineConfig {
                windows,
                confidence_policy: policy,
                trade_updates: !no_updates,
                ..EngineConfig::default()
            };
            let mut engine = SwingWatch::new(db_path, config)?;
            if !fresh {
                engine.restore().await?;
            }

            let feed: Box<dyn BarFeed> = match input {
                Some(path) => Box::new(JsonLinesFeed::open(path).await?),
                None => Box::new(JsonLinesFeed::stdin()),
            };
            let summary = stream(&mut engine, feed).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Signals { limit, state, symbol } => {
            let state = state.map(|s| s.parse::<SignalState>()).transpose()?;
            let engine = SwingWatch::new(db_path, EngineConfig::default())?;
            let signals = engine.signals(&SignalFilter {
                limit: Some(limit),
                state,
                symbol,
            })?;
            println!("{}", serde_json::to_string_pretty(&signals)?);
        }
        Commands::Show { id } => {
            let engine = SwingWatch::new(db_path, EngineConfig::default())?;
            let signal = engine.get_signal(&id)?;
            println!("{}", serde_json::to_string_pretty(&signal)?);
        }
        Commands::Messages { limit } => {
            let engine = SwingWatch::new(db_path, EngineConfig::default())?;
            let messages = engine.messages(limit)?;
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
    }
    Ok(())
}

async fn stream(
    engine: &mut SwingWatch,
    mut feed: Box<dyn BarFeed>,
) -> Result<EngineSummary, Box<dyn std::error::Error>> {
    info!(feed = feed.name(), windows = ?engine.config().windows, "streaming bars");
    let consumed = engine.consume(feed.as_mut()).await;
    // Drain queued store writes even when the feed failed.
    let summary = engine.shutdown().await?;
    if let Err(e) = consumed {
        error!(error = %e, "feed aborted");
        return Err(e.into());
    }
    Ok(summary)
}
