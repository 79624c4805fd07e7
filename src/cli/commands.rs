use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "swingwatch", about = "Swing failure pattern signals over streamed price bars")]
pub struct Cli {
    /// SQLite database holding signals and the message log
    #[arg(long, global = true, env = "SWINGWATCH_DB", default_value = "./swingwatch.db")]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream bars (one JSON object per line) through the engine
    Run {
        /// Bar file; reads stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        /// Composite window sizes in base bars, comma separated
        #[arg(long, value_delimiter = ',', default_value = "6")]
        windows: Vec<usize>,
        /// Confidence gate (accept-all, label:N)
        #[arg(long, default_value = "accept-all")]
        policy: String,
        /// Skip the trade update broadcast after each base window
        #[arg(long)]
        no_updates: bool,
        /// Start with an empty ledger instead of resuming stored signals
        #[arg(long)]
        fresh: bool,
    },
    /// List stored signals, newest first
    Signals {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Lifecycle state (pending, open, closed)
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Show one stored signal
    Show {
        id: String,
    },
    /// List sent alert messages, newest first
    Messages {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}
